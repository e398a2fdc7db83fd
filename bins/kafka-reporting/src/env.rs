use std::collections::HashMap;

use crate::error::CliError;

pub const REPORTING: &[&str] = &["REPORTING_SERVER", "REPORTING_USERNAME", "REPORTING_TOKEN"];
pub const SWIFT: &[&str] = &["OS_AUTH_URL", "OS_USERNAME", "OS_PASSWORD", "OS_TENANT_NAME"];
pub const S3: &[&str] = &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"];
pub const GCS: &[&str] = &["GOOGLE_SERVICE_ACCOUNT"];

/// Обязательные переменные окружения, проверенные заранее.
#[derive(Debug)]
pub struct Env {
    values: HashMap<&'static str, String>,
}

impl Env {
    /// Проверить сразу все группы; пустое значение считается отсутствующим.
    /// Ошибка перечисляет все недостающие имена в порядке объявления.
    pub fn require(groups: &[&[&'static str]]) -> Result<Self, CliError> {
        Self::require_with(groups, |name| std::env::var(name).ok())
    }

    pub fn require_with<F>(groups: &[&[&'static str]], lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = HashMap::new();
        let mut missing = Vec::new();
        for name in groups.iter().flat_map(|group| group.iter().copied()) {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => {
                    values.insert(name, value);
                }
                None if !missing.contains(&name) => missing.push(name),
                None => {}
            }
        }
        if missing.is_empty() {
            Ok(Self { values })
        } else {
            Err(CliError::MissingEnv(missing))
        }
    }

    /// Значение проверенной переменной. Для непроверенной: пустая строка.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }
}

/// Необязательная переменная (`OS_REGION_NAME`).
pub fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn all_present() {
        let env = Env::require_with(
            &[REPORTING],
            lookup(&[
                ("REPORTING_SERVER", "reporting.example.org"),
                ("REPORTING_USERNAME", "u"),
                ("REPORTING_TOKEN", "t"),
            ]),
        )
        .unwrap();
        assert_eq!(env.get("REPORTING_SERVER"), "reporting.example.org");
        assert_eq!(env.get("REPORTING_TOKEN"), "t");
    }

    #[test]
    fn collects_every_missing_name_across_groups() {
        let err = Env::require_with(
            &[REPORTING, SWIFT],
            lookup(&[("REPORTING_SERVER", "h"), ("OS_USERNAME", "u"), ("OS_PASSWORD", "")]),
        )
        .unwrap_err();
        match err {
            CliError::MissingEnv(names) => assert_eq!(
                names,
                vec![
                    "REPORTING_USERNAME",
                    "REPORTING_TOKEN",
                    "OS_AUTH_URL",
                    "OS_PASSWORD",
                    "OS_TENANT_NAME",
                ]
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_environment() {
        let err = Env::require_with(&[REPORTING, GCS], |_| None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing environment variables: REPORTING_SERVER REPORTING_USERNAME REPORTING_TOKEN GOOGLE_SERVICE_ACCOUNT"
        );
    }
}
