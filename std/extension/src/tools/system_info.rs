//! The `system_info` tool.

use crate::{
    error::ToolError,
    roots::AllowedRoots,
    schema::{Field, Schema},
    tools::Tool,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeSet, env};
use tokio::fs;

pub static SCHEMA: Schema = Schema::new(&[Field::choice(
    "category",
    "Information category",
    Category::CODES,
)
.with_default("python")]);

/// Environment variables whose lowercased name contains any of these are
/// never reported.
const SENSITIVE: &[&str] = &["password", "secret", "key", "token"];

/// Maximum number of entries in `safe_environment`.
pub const SAMPLE_LIMIT: usize = 10;

/// Number of `PATH` entries reported in `search_path`.
const SEARCH_PATH_LIMIT: usize = 5;

/// Which facts to report. `python` names the runtime category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Python,
    System,
    Environment,
}

impl Category {
    pub const CODES: &'static [&'static str] = &["python", "system", "environment"];
}

/// Arguments for `system_info`.
#[derive(Debug, Deserialize)]
pub struct SystemInfoArgs {
    pub category: Category,
}

/// Result of `system_info`.
#[derive(Debug, Serialize)]
pub struct SystemReport {
    pub category: Category,
    #[serde(flatten)]
    pub facts: Facts,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Facts {
    Runtime(RuntimeFacts),
    Host(HostFacts),
    Environment(EnvironmentFacts),
}

#[derive(Debug, Serialize)]
pub struct RuntimeFacts {
    pub runtime_version: String,
    pub executable: Option<String>,
    pub search_path: Vec<String>,
    pub platform: &'static str,
    /// Distinct shared objects mapped into the process, where the OS
    /// exposes them.
    pub modules_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HostFacts {
    pub platform: String,
    pub system: &'static str,
    pub family: &'static str,
    pub release: String,
    pub version: String,
    pub machine: &'static str,
    pub processor: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentFacts {
    pub environment_count: usize,
    pub allowed_paths: Vec<String>,
    pub current_directory: String,
    pub safe_environment: Map<String, Value>,
}

/// Whether a variable name looks like it holds a credential.
pub fn is_sensitive(name: &str) -> bool {
    let name = name.to_lowercase();
    SENSITIVE.iter().any(|marker| name.contains(marker))
}

/// Count `vars` and keep the first [`SAMPLE_LIMIT`] non-sensitive ones.
pub fn sample_environment<I>(vars: I) -> (usize, Map<String, Value>)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut count = 0;
    let mut sample = Map::new();
    for (name, value) in vars {
        count += 1;
        if sample.len() < SAMPLE_LIMIT && !is_sensitive(&name) {
            sample.insert(name, Value::String(value));
        }
    }
    (count, sample)
}

fn os_name() -> &'static str {
    match env::consts::OS {
        "linux" | "android" => "Linux",
        "macos" | "ios" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

async fn kernel_value(key: &str) -> String {
    fs::read_to_string(format!("/proc/sys/kernel/{key}"))
        .await
        .map(|s| s.trim().to_owned())
        .unwrap_or_default()
}

async fn loaded_modules() -> Option<usize> {
    let maps = fs::read_to_string("/proc/self/maps").await.ok()?;
    let objects: BTreeSet<&str> = maps
        .lines()
        .filter_map(|line| line.split_whitespace().nth(5))
        .filter(|path| path.contains(".so"))
        .collect();
    Some(objects.len())
}

async fn runtime() -> RuntimeFacts {
    let search_path = env::var_os("PATH")
        .map(|paths| {
            env::split_paths(&paths)
                .take(SEARCH_PATH_LIMIT)
                .map(|p| p.display().to_string())
                .collect()
        })
        .unwrap_or_default();
    RuntimeFacts {
        runtime_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        executable: env::current_exe().ok().map(|p| p.display().to_string()),
        search_path,
        platform: env::consts::OS,
        modules_count: loaded_modules().await,
    }
}

async fn host() -> HostFacts {
    let system = os_name();
    let release = kernel_value("osrelease").await;
    let platform = [system, release.as_str(), env::consts::ARCH]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    HostFacts {
        platform,
        system,
        family: env::consts::FAMILY,
        release,
        version: kernel_value("version").await,
        machine: env::consts::ARCH,
        processor: env::consts::ARCH,
    }
}

fn environment(roots: &AllowedRoots) -> Result<EnvironmentFacts, ToolError> {
    let vars = env::vars_os().map(|(name, value)| {
        (
            name.to_string_lossy().into_owned(),
            value.to_string_lossy().into_owned(),
        )
    });
    let (environment_count, safe_environment) = sample_environment(vars);
    Ok(EnvironmentFacts {
        environment_count,
        allowed_paths: roots.display_list(),
        current_directory: env::current_dir()?.display().to_string(),
        safe_environment,
    })
}

/// Reports runtime, host and environment facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInfo;

impl Tool for SystemInfo {
    type Args = SystemInfoArgs;
    type Output = SystemReport;

    async fn execute(
        &self,
        args: SystemInfoArgs,
        roots: &AllowedRoots,
    ) -> Result<SystemReport, ToolError> {
        let facts = match args.category {
            Category::Python => Facts::Runtime(runtime().await),
            Category::System => Facts::Host(host().await),
            Category::Environment => Facts::Environment(environment(roots)?),
        };
        Ok(SystemReport {
            category: args.category,
            facts,
        })
    }
}
