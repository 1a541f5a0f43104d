use mdnb_sequencer::{
    command_sequence, to_shell_invocation, CommandSequence, EnvStore, Platform, SharedEnvStore,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn platform_joins_diverge() {
    let seq: CommandSequence = ["echo a", "echo b"].into_iter().collect();
    let joins: Vec<_> = [Platform::MacOs, Platform::Unix, Platform::Windows]
        .into_iter()
        .map(|p| to_shell_invocation(&seq, p))
        .collect();
    assert_eq!(
        joins,
        vec![
            Some("set -e -o pipefail; echo a; echo b".to_string()),
            Some("set -e; echo a; echo b".to_string()),
            Some("echo a; echo b".to_string()),
        ]
    );
}

#[test]
fn readme_style_cell() {
    let seq = command_sequence(
        "# install dependencies\n$ brew bundle --no-lock\n\
         $ pnpm install \\\n    --frozen-lockfile # ci\n",
    );
    assert_eq!(
        seq.commands(),
        ["brew bundle --no-lock", "pnpm install --frozen-lockfile"]
    );
}

#[test]
fn environment_reset_law() {
    let mut env = EnvStore::new();
    env.set("X", "1");
    env.reset();
    assert_eq!(env.get("X"), None);

    env.set("PAGER", "less");
    env.reset();
    assert_eq!(env.get("PAGER"), Some("cat"));
}

#[test]
fn sessions_are_serialized_across_threads() {
    let shared = SharedEnvStore::new();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let mut session = shared.session();
                assert_eq!(session.len(), 2);
                session.set(format!("RUN_{i}"), "1");
                session.len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

proptest! {
    #[test]
    fn prop_sequencing_is_pure(text in "[a-z$#\\\\ \n]{0,64}") {
        prop_assert_eq!(command_sequence(&text), command_sequence(&text));
    }

    #[test]
    fn prop_commands_are_trimmed_single_lines(text in "[a-z$#\\\\ \n]{0,64}") {
        for command in command_sequence(&text).iter() {
            prop_assert!(!command.is_empty());
            prop_assert!(!command.contains('\n'));
            prop_assert_eq!(command.trim(), command);
        }
    }

    #[test]
    fn prop_windows_is_plain_join(commands in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let seq: CommandSequence = commands.iter().cloned().collect();
        prop_assert_eq!(
            to_shell_invocation(&seq, Platform::Windows),
            Some(commands.join("; "))
        );
    }
}
