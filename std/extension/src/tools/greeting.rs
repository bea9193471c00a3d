//! The `hello` tool.

use crate::{
    SERVER_NAME,
    error::ToolError,
    roots::AllowedRoots,
    schema::{Field, Schema},
    tools::Tool,
};
use serde::{Deserialize, Serialize};

pub static SCHEMA: Schema = Schema::new(&[
    Field::string("name", "Name to greet").with_default("World"),
    Field::choice("language", "Language for greeting", Language::CODES).with_default("en"),
]);

const EN: &str = "Hello, {name}!";

const TEMPLATES: &[(&str, &str)] = &[
    ("en", EN),
    ("es", "¡Hola, {name}!"),
    ("fr", "Bonjour, {name}!"),
    ("de", "Hallo, {name}!"),
];

/// Supported greeting languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
}

impl Language {
    pub const CODES: &'static [&'static str] = &["en", "es", "fr", "de"];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }
}

/// Arguments for `hello`.
#[derive(Debug, Deserialize)]
pub struct GreetingArgs {
    pub name: String,
    pub language: Language,
}

/// Result of `hello`.
#[derive(Debug, Serialize)]
pub struct GreetingReport {
    pub greeting: String,
    pub language: Language,
    pub server_version: &'static str,
    pub server_info: ServerDetails,
}

#[derive(Debug, Serialize)]
pub struct ServerDetails {
    pub name: &'static str,
    pub allowed_paths: Vec<String>,
}

/// Look up the template for a language code, falling back to English.
fn template(code: &str) -> &'static str {
    TEMPLATES
        .iter()
        .find(|(lang, _)| *lang == code)
        .map_or(EN, |&(_, template)| template)
}

/// Greets a name in one of a few languages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeting;

impl Tool for Greeting {
    type Args = GreetingArgs;
    type Output = GreetingReport;

    async fn execute(
        &self,
        args: GreetingArgs,
        roots: &AllowedRoots,
    ) -> Result<GreetingReport, ToolError> {
        Ok(GreetingReport {
            greeting: template(args.language.code()).replace("{name}", &args.name),
            language: args.language,
            server_version: env!("CARGO_PKG_VERSION"),
            server_info: ServerDetails {
                name: SERVER_NAME,
                allowed_paths: roots.display_list(),
            },
        })
    }
}
