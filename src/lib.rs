// If code coverage tool `cargo-llvm-cov` is running with the nightly toolchain,
// enable the unstable “coverage” attribute. This allows using the annotation
// `#[coverage(off)]` to explicitly exclude certain parts of the code from
// being considered as “code under test.” Most prominently, the annotation
// should be added to every `#[cfg(test)]` module. Since the “coverage”
// feature is enable only conditionally, the annotation to use is:
// `#[cfg_attr(coverage_nightly, coverage(off))]`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(clippy::shadow_unrelated)]

pub mod api;
pub mod application;
pub mod recovery_words;
pub mod state;
pub mod util_types;


use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use application::config::cli_args;
use application::config::cli_args::Command;
use application::config::data_directory::DataDirectory;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use crate::api::derive_address::DeriveAddressApi;
use crate::api::derive_address::ListDerivationPaths;
use crate::recovery_words::RecoveryWords;
use crate::recovery_words::RecoveryWordsEvent;
use crate::recovery_words::PHRASE_LENGTH;
use crate::state::key_store::MemoryKeyStore;

pub const SUCCESS_EXIT_CODE: i32 = 0;
pub const REJECTED_EXIT_CODE: i32 = 2;
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the command described by `cli_args` and returns the process exit code.
pub async fn initialize(cli_args: cli_args::Args) -> Result<i32> {
    info!("Starting keyguard {VERSION}.");

    match cli_args.command {
        Command::DeriveAddress {
            request: request_file,
        } => {
            let key_store_path = DataDirectory::get(cli_args.data_dir.clone())?
                .key_store_file_path(cli_args.key_store.clone());
            let key_store = Arc::new(MemoryKeyStore::read_from_file(&key_store_path).await?);

            let request_text = tokio::fs::read_to_string(&request_file)
                .await
                .with_context(|| {
                    format!("Failed to read request from {}", request_file.display())
                })?;
            let request: serde_json::Value =
                serde_json::from_str(&request_text).with_context(|| {
                    format!("Failed to decode request from {}", request_file.display())
                })?;

            let cancel = CancellationToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_cancel.cancel();
                }
            });

            let api = DeriveAddressApi::new(key_store);
            match api.on_request(&request, ListDerivationPaths, cancel).await {
                Ok(paths) => {
                    println!("{}", serde_json::to_string_pretty(&paths)?);
                    Ok(SUCCESS_EXIT_CODE)
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.to_response())?);
                    Ok(REJECTED_EXIT_CODE)
                }
            }
        }
        Command::EnterWords => {
            tokio::task::spawn_blocking(|| enter_words(std::io::stdin().lock())).await?
        }
    }
}

/// Feeds whitespace-separated words from `input` into a [`RecoveryWords`]
/// collector, one line at a time, until the phrase can be submitted. Once
/// every slot was written without success, input resumes at the first slot
/// that is empty or holds an unknown word.
fn enter_words<R: BufRead>(input: R) -> Result<i32> {
    let mut recovery_words = RecoveryWords::new();
    let mut subscription = recovery_words.subscribe();
    let mut next_slot = 0;

    eprintln!("Please enter your {PHRASE_LENGTH} recovery words.");
    for line in input.lines() {
        let line = line.context("Failed to read recovery words")?;
        next_slot += recovery_words.paste(next_slot, &line);

        while let Ok(event) = subscription.events.try_recv() {
            match event {
                RecoveryWordsEvent::Incomplete => {}
                RecoveryWordsEvent::Invalid => {
                    eprintln!("Invalid recovery words. Please check your input.");
                }
                RecoveryWordsEvent::Complete { mnemonic_type } => {
                    eprintln!("Recovery words complete ({mnemonic_type}).");
                }
                RecoveryWordsEvent::Submitted(_) => {}
            }
        }

        if recovery_words.can_submit() {
            break;
        }
        if next_slot >= PHRASE_LENGTH {
            // start over on the first bad slot, as the form would
            next_slot = recovery_words.focus().unwrap_or(0);
        }
    }

    match recovery_words.submit() {
        Ok(submitted) => {
            println!("{}", submitted.mnemonic_type());
            Ok(SUCCESS_EXIT_CODE)
        }
        Err(unfinished) => {
            warn!(
                "Input ended before a valid phrase was entered. Status: {}",
                unfinished.status()
            );
            Ok(REJECTED_EXIT_CODE)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod lib_tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use macro_rules_attr::apply;
    use tracing_test::traced_test;

    use super::*;
    use crate::state::key_store::KeyInfo;
    use crate::state::key_store::KeyType;
    use crate::tests::shared::bip39_test_phrase;
    use crate::tests::shared::invalid_checksum_phrase;
    use crate::tests::shared::unit_test_data_directory;
    use crate::tests::shared_tokio_runtime;

    fn lines(lines: &[String]) -> Cursor<String> {
        Cursor::new(lines.join("\n"))
    }

    #[traced_test]
    #[test]
    fn phrase_spread_over_lines_is_accepted() {
        let phrase = bip39_test_phrase();
        let input = lines(&[phrase[..10].join(" "), phrase[10..].join("  ")]);
        assert_eq!(SUCCESS_EXIT_CODE, enter_words(input).unwrap());
    }

    #[traced_test]
    #[test]
    fn entry_resumes_at_unknown_word() {
        let mut phrase = bip39_test_phrase();
        phrase[3] = "bitcoin".to_string();
        let input = lines(&[phrase.join(" "), "abandon".to_string()]);
        assert_eq!(SUCCESS_EXIT_CODE, enter_words(input).unwrap());
    }

    #[traced_test]
    #[test]
    fn entry_restarts_after_bad_checksum() {
        let input = lines(&[
            invalid_checksum_phrase().join(" "),
            bip39_test_phrase().join(" "),
        ]);
        assert_eq!(SUCCESS_EXIT_CODE, enter_words(input).unwrap());
    }

    #[traced_test]
    #[test]
    fn input_ending_early_is_rejected() {
        let phrase = bip39_test_phrase();
        let input = lines(&[phrase[..PHRASE_LENGTH - 1].join(" ")]);
        assert_eq!(REJECTED_EXIT_CODE, enter_words(input).unwrap());
        assert!(logs_contain("Input ended before a valid phrase was entered"));

        let invalid = lines(&[invalid_checksum_phrase().join(" ")]);
        assert_eq!(REJECTED_EXIT_CODE, enter_words(invalid).unwrap());
    }

    async fn derive_address_args(test_name: &str, request: serde_json::Value) -> cli_args::Args {
        let dir = unit_test_data_directory(test_name);
        let key_store = MemoryKeyStore::new();
        key_store.put(KeyInfo::new("k1", KeyType::Bip39)).await;
        key_store
            .save_to_disk(&dir.join("keys.json"))
            .await
            .unwrap();

        let request_file = dir.join("request.json");
        tokio::fs::write(&request_file, request.to_string())
            .await
            .unwrap();

        cli_args::Args {
            data_dir: Some(dir),
            key_store: None,
            command: Command::DeriveAddress {
                request: request_file,
            },
        }
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn derive_address_command_exit_codes() {
        let valid = serde_json::json!({
            "appName": "Test",
            "keyId": "k1",
            "baseKeyPath": "m/44'/242'",
            "indicesToDerive": [0],
        });
        let args = derive_address_args("derive_address_command_valid", valid).await;
        assert_eq!(SUCCESS_EXIT_CODE, initialize(args).await.unwrap());

        let unknown_key = serde_json::json!({"appName": "Test", "keyId": "k2"});
        let args = derive_address_args("derive_address_command_unknown", unknown_key).await;
        assert_eq!(REJECTED_EXIT_CODE, initialize(args).await.unwrap());
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn derive_address_command_fails_on_corrupt_key_store() {
        let dir = unit_test_data_directory("derive_address_command_corrupt");
        let key_store_file = dir.join("broken.json");
        tokio::fs::write(&key_store_file, "[{").await.unwrap();

        let args = cli_args::Args {
            data_dir: Some(dir),
            key_store: Some(key_store_file),
            command: Command::DeriveAddress {
                request: PathBuf::from("unused.json"),
            },
        };
        assert!(initialize(args).await.is_err());
    }
}
