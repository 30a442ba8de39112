use thanks_core::draft::{Draft, DraftError, MentionSet};
use thanks_core::settings::settings;
use thanks_core::unicode::{char_len, normalize};

/// Print the canonical search form of each argument.
pub fn normalize_cmd(texts: &[String], json: bool) {
    if json {
        let pairs: Vec<_> = texts
            .iter()
            .map(|t| serde_json::json!({ "input": t, "normalized": normalize(t) }))
            .collect();
        println!("{}", die!(serde_json::to_string_pretty(&pairs), "Error: {}"));
        return;
    }
    for text in texts {
        println!("{text}\t{}", normalize(text));
    }
}

/// Validate a post body the way the compose dialog does.
pub fn check_draft_cmd(text: &str) {
    let mut draft = Draft::new();
    let result = if draft.set_content(text) {
        draft.validate(&MentionSet::new(settings().draft.max_mentions))
    } else {
        Err(DraftError::ContentTooLong {
            len: char_len(text),
            max: settings().draft.max_content_chars,
        })
    };
    match result {
        Ok(()) => println!(
            "OK: {} characters, {} left",
            char_len(draft.content()),
            draft.remaining()
        ),
        Err(e) => {
            eprintln!("Rejected: {e}");
            std::process::exit(1);
        }
    }
}
