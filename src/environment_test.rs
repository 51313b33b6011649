// Unit tests for environment resolution and credentials

use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_resolve_known_environments() {
    let overrides = EnvOverrides::default();

    let qa = Environment::resolve("qa", &overrides).unwrap();
    assert_eq!(qa.name, EnvironmentName::Qa);
    assert_eq!(qa.base_url, "https://qa-test.intellisense.io");
    assert_eq!(qa.login_path, "https://qa-test.intellisense.io/next/signin");
    assert_eq!(qa.api_base_url, "https://qa-test.intellisense.io/api");

    let local = Environment::resolve("local", &overrides).unwrap();
    assert_eq!(local.base_url, "http://localhost:3000");
    assert_eq!(local.login_path, "http://localhost:3000/next/signin");
    assert_eq!(local.api_base_url, "http://localhost:3001/api");

    let staging = Environment::resolve("Staging", &overrides).unwrap();
    assert_eq!(staging.name, EnvironmentName::Staging);

    let production = Environment::resolve("production", &overrides).unwrap();
    assert_eq!(production.base_url, "https://app.intellisense.io");
}

#[test]
fn test_unknown_environment_fails_fast() {
    let err = Environment::resolve("qa2", &EnvOverrides::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("Unknown environment 'qa2'"));
}

#[test]
fn test_base_url_override() {
    let overrides = EnvOverrides {
        base_url: Some("https://preview.example.com/".to_string()),
        api_base_url: None,
    };

    let env = Environment::resolve("staging", &overrides).unwrap();
    assert_eq!(env.base_url, "https://preview.example.com");
    assert_eq!(env.login_path, "https://preview.example.com/next/signin");
    // API URL keeps the environment default when only BASE_URL is set
    assert_eq!(env.api_base_url, "https://staging.intellisense.io/api");

    // Local ignores overrides
    let local = Environment::resolve("local", &overrides).unwrap();
    assert_eq!(local.base_url, "http://localhost:3000");
}

#[test]
fn test_invalid_override_is_config_error() {
    let overrides = EnvOverrides {
        base_url: Some("not a url".to_string()),
        api_base_url: None,
    };
    let err = Environment::resolve("qa", &overrides).unwrap_err();
    assert!(matches!(err, SuiteError::Config(_)));
    assert!(err.to_string().contains("BASE_URL"));
}

#[test]
fn test_environment_url_join() {
    let env = Environment::resolve("local", &EnvOverrides::default()).unwrap();
    assert_eq!(env.url("/next/profile"), "http://localhost:3000/next/profile");
    assert_eq!(env.url("next/home"), "http://localhost:3000/next/home");
}

#[test]
fn test_credentials_defaults_and_overrides() {
    let lookup = lookup_from(&[
        ("QA_STANDARD_USER_EMAIL", "qa.bot@example.com"),
        ("QA_STANDARD_USER_PASSWORD", "s3cret"),
        ("QA_ADMIN_USER_NAME", ""),
    ]);
    let creds = CredentialSet::from_lookup(&lookup);

    assert_eq!(creds.standard.email, "qa.bot@example.com");
    assert_eq!(creds.standard.password, "s3cret");
    assert_eq!(creds.standard.display_name, "QA Standard User");

    // Empty values fall back to the defaults
    assert_eq!(creds.get(Role::Admin).display_name, "QA Admin User");
    assert_eq!(creds.get(Role::Readonly).email, "readonly_user@example.com");
}

#[test]
fn test_credentials_debug_redacts_password() {
    let lookup = lookup_from(&[("QA_STANDARD_USER_PASSWORD", "hunter2")]);
    let creds = Credentials::for_role(Role::Standard, &lookup);
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("<redacted>"));
}
