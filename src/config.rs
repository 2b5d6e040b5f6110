use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::identity::Identity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Company {
    pub positions: Vec<String>,
    pub employees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub companies: BTreeMap<String, Company>,
    #[serde(default)]
    pub default_company: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut companies = BTreeMap::new();
        companies.insert(
            "WebStead".to_string(),
            Company {
                positions: vec!["Backend developer".into(), "Frontend developer".into()],
                employees: vec!["dmitryace".into(), "ivanov_ivan".into()],
            },
        );
        companies.insert(
            "TechSolutions".to_string(),
            Company {
                positions: vec!["System administrator".into(), "DevOps engineer".into()],
                employees: vec!["petrov_petr".into(), "sidorova_anna".into()],
            },
        );
        Self {
            companies,
            default_company: Some("WebStead".to_string()),
        }
    }
}

impl Config {
    pub fn company_names(&self) -> Vec<&str> {
        self.companies.keys().map(String::as_str).collect()
    }

    pub fn company(&self, name: &str) -> Option<&Company> {
        self.companies.get(name)
    }

    /// Starting selection: the requested company/employee when they exist,
    /// otherwise the default company and its first position and employee.
    pub fn initial_identity(&self, company: Option<&str>, employee: Option<&str>) -> Identity {
        let company_name = company
            .filter(|c| self.companies.contains_key(*c))
            .or(self.default_company.as_deref().filter(|c| self.companies.contains_key(*c)))
            .or_else(|| self.companies.keys().next().map(String::as_str))
            .unwrap_or_default()
            .to_string();

        let entry = self.companies.get(&company_name).cloned().unwrap_or_default();
        let employee = employee
            .filter(|e| entry.employees.iter().any(|x| x == *e))
            .map(str::to_string)
            .or_else(|| entry.employees.first().cloned())
            .unwrap_or_default();
        let position = entry.positions.first().cloned().unwrap_or_default();

        Identity::new(company_name, employee, position)
    }

    /// Identity after moving to the company following the current one.
    /// Position and employee reset to the new company's first entries.
    pub fn next_company(&self, current: &Identity) -> Identity {
        let names: Vec<String> = self.companies.keys().cloned().collect();
        let company = cycle(&names, &current.company)
            .cloned()
            .unwrap_or_else(|| current.company.clone());
        self.initial_identity(Some(company.as_str()), None)
    }

    pub fn next_employee(&self, current: &Identity) -> Identity {
        let employee = self
            .company(&current.company)
            .and_then(|c| cycle(&c.employees, &current.employee))
            .cloned()
            .unwrap_or_else(|| current.employee.clone());
        Identity {
            employee,
            ..current.clone()
        }
    }

    pub fn next_position(&self, current: &Identity) -> Identity {
        let position = self
            .company(&current.company)
            .and_then(|c| cycle(&c.positions, &current.position))
            .cloned()
            .unwrap_or_else(|| current.position.clone());
        Identity {
            position,
            ..current.clone()
        }
    }

    /// Company with no employees would leave nothing to track
    fn is_usable(&self) -> bool {
        !self.companies.is_empty() && self.companies.values().all(|c| !c.employees.is_empty())
    }
}

/// Entry after `current`, wrapping around; the first entry if `current` is absent
fn cycle<'a>(items: &'a [String], current: &str) -> Option<&'a String> {
    let next = items
        .iter()
        .position(|item| item == current)
        .map_or(0, |idx| (idx + 1) % items.len());
    items.get(next)
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) if cfg.is_usable() => cfg,
            Ok(_) => {
                warn!(path = %self.path.display(), "config lists no employees, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
