//! Integration tests for memory backend selection and initialization
//!
//! Each test runs the real config loader and vector store against a temp
//! project, with a mock connector standing in for the embedding providers.


use mneme::config::{EnvConfig, ProjectConfig};
use mneme::error::InitError;
use mneme::{
    BackendChoice, BackendKind, DeferReason, InitOutcome, MemoryBackendSelector, MemoryStatus,
    MnemeError, initialize, select,
};
use std::collections::BTreeMap;
use test_utils::{MockConnector, TestProject, env_with_openai_key};

// ═══════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════

#[tokio::test]
async fn test_scenario_a_no_config_defers() {
    let project = TestProject::new();

    let config = ProjectConfig::load(project.root()).expect("load must not fail");
    assert!(config.is_none());
    assert_eq!(select(config.as_ref()), BackendChoice::Unset);

    let connector = MockConnector::new();
    let outcome = initialize(project.root(), &EnvConfig::default(), connector.clone())
        .await
        .unwrap();
    assert!(matches!(outcome, InitOutcome::Deferred(DeferReason::NoConfig)));
    assert_eq!(connector.calls(), 0);

    // Deferral never writes a config
    assert!(!ProjectConfig::config_path(project.root()).exists());
}

#[tokio::test]
async fn test_scenario_b_empty_config_is_unset() {
    let project = TestProject::new();
    project.write_config("");

    let config = ProjectConfig::load(project.root()).unwrap();
    assert!(config.is_some());
    assert_eq!(select(config.as_ref()), BackendChoice::Unset);

    let connector = MockConnector::new();
    let outcome = initialize(project.root(), &EnvConfig::default(), connector.clone())
        .await
        .unwrap();
    assert!(matches!(outcome, InitOutcome::Deferred(DeferReason::PlatformUnset)));
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_scenario_c_openai_constructs_handle() {
    let project = TestProject::new();
    project.write_config("platform = \"OpenAI\"\n");

    let config = ProjectConfig::load(project.root()).unwrap();
    let choice = select(config.as_ref());
    assert_eq!(choice, BackendChoice::RemoteOpenAi);

    let connector = MockConnector::new();
    let selector = MemoryBackendSelector::new(project.root(), env_with_openai_key(), connector.clone());
    let handle = selector.construct(&choice, config.as_ref()).await.unwrap();

    assert_eq!(handle.backend(), BackendKind::RemoteOpenAi);
    assert_eq!(connector.calls(), 1);
    assert!(
        handle
            .store_path()
            .is_some_and(|p| p.starts_with(project.root()))
    );

    let id = handle
        .remember("deployed the api to staging", BTreeMap::new())
        .await
        .unwrap();
    let hits = handle.recall("staging deploy of the api", 3).await.unwrap();
    assert_eq!(hits[0].record.id, id);
}

#[tokio::test]
async fn test_scenario_c_credential_check_failure() {
    let project = TestProject::new();
    project.write_config("platform = \"OpenAI\"\n");

    let connector = MockConnector::new();
    let err = initialize(project.root(), &EnvConfig::default(), connector.clone())
        .await
        .unwrap_err();
    match err {
        MnemeError::Init(InitError::BackendUnavailable { backend, reason }) => {
            assert_eq!(backend, BackendKind::RemoteOpenAi);
            assert!(reason.contains("API key"));
        }
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_scenario_d_unknown_platform_is_reported() {
    let project = TestProject::new();
    project.write_config("platform = \"Unknown123\"\n");

    let config = ProjectConfig::load(project.root()).unwrap();
    assert_eq!(
        select(config.as_ref()),
        BackendChoice::Unsupported("Unknown123".into())
    );

    let connector = MockConnector::new();
    let outcome = initialize(project.root(), &EnvConfig::default(), connector.clone())
        .await
        .unwrap();
    match &outcome {
        InitOutcome::Unsupported(id) => assert_eq!(id, "Unknown123"),
        other => panic!("expected Unsupported, got {other:?}"),
    }
    assert_eq!(connector.calls(), 0);

    let status = outcome.status().await.unwrap();
    assert!(status.to_string().contains("Unknown123"));
}

// ═══════════════════════════════════════
// SELECTION PROPERTIES
// ═══════════════════════════════════════

#[tokio::test]
async fn test_construct_refuses_unset_and_unsupported() {
    let project = TestProject::new();
    let connector = MockConnector::new();
    let selector = MemoryBackendSelector::new(project.root(), env_with_openai_key(), connector.clone());

    for choice in [
        BackendChoice::Unset,
        BackendChoice::Unsupported("Unknown123".into()),
    ] {
        let err = selector.construct(&choice, None).await.unwrap_err();
        match err {
            InitError::UnsupportedChoice(c) => assert_eq!(c, choice),
            other => panic!("expected UnsupportedChoice, got {other:?}"),
        }
    }

    assert_eq!(connector.calls(), 0);
    assert!(!project.root().join(".mneme").exists());
}

#[test]
fn test_select_is_idempotent() {
    let project = TestProject::new();
    for contents in ["", "platform = \"Ollama\"", "platform = \"\"", "platform = \"Nope\""] {
        project.write_config(contents);
        let config = ProjectConfig::load(project.root()).unwrap();
        assert_eq!(select(config.as_ref()), select(config.as_ref()));

        // A fresh read of the same file agrees too
        let again = ProjectConfig::load(project.root()).unwrap();
        assert_eq!(select(config.as_ref()), select(again.as_ref()));
    }
}

#[test]
fn test_select_is_bijective_over_recognized_ids() {
    let choices: Vec<BackendChoice> = BackendKind::ALL
        .iter()
        .map(|kind| {
            let config = ProjectConfig::for_platform(*kind);
            let choice = select(Some(&config));
            assert_eq!(choice.backend(), Some(*kind));
            choice
        })
        .collect();

    for (i, a) in choices.iter().enumerate() {
        for b in &choices[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_unrecognized_values_carried_verbatim() {
    for raw in ["Unknown123", "open ai", "lancedb", "OpenAI2", "ÖLLAMA"] {
        let config = ProjectConfig {
            platform: Some(raw.to_string()),
            ..ProjectConfig::default()
        };
        assert_eq!(select(Some(&config)), BackendChoice::Unsupported(raw.to_string()));
    }
}

#[tokio::test]
async fn test_unsupported_platform_keeps_surrounding_whitespace() {
    let project = TestProject::new();
    project.write_config("platform = \" Gemini \"\n");

    let config = ProjectConfig::load(project.root()).unwrap();
    assert_eq!(
        select(config.as_ref()),
        BackendChoice::Unsupported(" Gemini ".into())
    );

    let outcome = initialize(project.root(), &EnvConfig::default(), MockConnector::new())
        .await
        .unwrap();
    match outcome {
        InitOutcome::Unsupported(id) => assert_eq!(id, " Gemini "),
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[test]
fn test_config_with_only_unrelated_keys_is_unset() {
    let project = TestProject::new();
    project.write_config(
        r#"
model = "gpt-4o"
workspace = "agent"

[memory]
dimensions = 256
"#,
    );
    let config = ProjectConfig::load(project.root()).unwrap();
    assert_eq!(select(config.as_ref()), BackendChoice::Unset);
}

// ═══════════════════════════════════════
// LIFE-CYCLE
// ═══════════════════════════════════════

#[tokio::test]
async fn test_malformed_config_is_typed_error() {
    let project = TestProject::new();
    project.write_config("platform = \"OpenAI");

    let err = initialize(project.root(), &EnvConfig::default(), MockConnector::new())
        .await
        .unwrap_err();
    match err {
        MnemeError::Config(e) => {
            assert_eq!(e.path(), &ProjectConfig::config_path(project.root()));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disabled_memory_defers_before_reading_config() {
    let project = TestProject::new();
    // Malformed on purpose: must not even be read
    project.write_config("platform = [");

    let env = EnvConfig {
        disable_memory: true,
        ..EnvConfig::default()
    };
    let outcome = initialize(project.root(), &env, MockConnector::new()).await.unwrap();
    assert!(matches!(outcome, InitOutcome::Deferred(DeferReason::Disabled)));
}

#[tokio::test]
async fn test_local_backend_persists_across_initializations() {
    let project = TestProject::new();
    project.write_config("platform = \"ollama\"\n");

    let first = initialize(project.root(), &EnvConfig::default(), MockConnector::new())
        .await
        .unwrap()
        .into_handle()
        .expect("local backend should be ready");
    assert_eq!(first.backend(), BackendKind::LocalVectorStore);
    first
        .remember("the cache lives in /var/cache/app", BTreeMap::new())
        .await
        .unwrap();
    drop(first);

    let outcome = initialize(project.root(), &EnvConfig::default(), MockConnector::new())
        .await
        .unwrap();
    match outcome.status().await.unwrap() {
        MemoryStatus::Ready { backend, records, .. } => {
            assert_eq!(backend, BackendKind::LocalVectorStore);
            assert_eq!(records, 1);
        }
        other => panic!("expected ready, got {other:?}"),
    }
}

#[tokio::test]
async fn test_switching_backend_uses_separate_store() {
    let project = TestProject::new();
    project.write_config("platform = \"Ollama\"\n");
    let local = initialize(project.root(), &EnvConfig::default(), MockConnector::new())
        .await
        .unwrap()
        .into_handle()
        .unwrap();
    local.remember("local note", BTreeMap::new()).await.unwrap();
    let local_path = local.store_path().map(|p| p.to_path_buf());
    drop(local);

    project.write_config("platform = \"OpenAI\"\n");
    let remote = initialize(project.root(), &env_with_openai_key(), MockConnector::new())
        .await
        .unwrap()
        .into_handle()
        .unwrap();
    assert_ne!(remote.store_path().map(|p| p.to_path_buf()), local_path);
    assert_eq!(remote.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_store_stamped_by_other_provider_is_unavailable() {
    let project = TestProject::new();
    // Point both backends at the same file
    project.write_config(
        r#"
platform = "Ollama"
[memory]
store_path = "shared.db"
"#,
    );
    drop(
        initialize(project.root(), &EnvConfig::default(), MockConnector::new())
            .await
            .unwrap(),
    );

    project.write_config(
        r#"
platform = "OpenAI"
[memory]
store_path = "shared.db"
"#,
    );
    let err = initialize(project.root(), &env_with_openai_key(), MockConnector::new())
        .await
        .unwrap_err();
    match err {
        MnemeError::Init(InitError::BackendUnavailable { backend, reason }) => {
            assert_eq!(backend, BackendKind::RemoteOpenAi);
            assert!(reason.contains("mock-ollama"));
        }
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connector_failure_is_backend_unavailable() {
    let project = TestProject::new();
    project.write_config("platform = \"Ollama\"\n");

    let connector = MockConnector::failing("Ollama is not reachable at http://localhost:11434");
    let err = initialize(project.root(), &EnvConfig::default(), connector.clone())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not reachable"));
    assert_eq!(connector.calls(), 1);
}
