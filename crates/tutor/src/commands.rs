#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Subjects,
    SubjectAdd(String),
    SubjectRemove(String),
    SubjectUse(String),
    Note(String),
    NoteRemove { subject: String, id: String },
    Notes(Option<String>),
    History,
    Clear,
    Quit,
    /// Known command with missing or malformed arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub const SUBJECT_USAGE: &str = "/subject add|remove|use <name>";
pub const NOTE_USAGE: &str = "/note <text>  or  /note remove <subject> <id>";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/subjects" => SlashCommand::Subjects,
        "/subject" => parse_subject(rest),
        "/note" => parse_note(rest),
        "/notes" => SlashCommand::Notes(non_empty(rest)),
        "/history" => SlashCommand::History,
        "/clear" => SlashCommand::Clear,
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn parse_subject(rest: &str) -> SlashCommand {
    let (action, name) = match rest.split_once(char::is_whitespace) {
        Some((action, name)) => (action, name.trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return SlashCommand::Usage(SUBJECT_USAGE);
    }

    match action {
        "add" => SlashCommand::SubjectAdd(name.to_string()),
        "remove" | "rm" => SlashCommand::SubjectRemove(name.to_string()),
        "use" => SlashCommand::SubjectUse(name.to_string()),
        _ => SlashCommand::Usage(SUBJECT_USAGE),
    }
}

/// `/note remove <subject> <id>`: the id is the last word, the subject name
/// is everything between.
fn parse_note(rest: &str) -> SlashCommand {
    if rest.is_empty() {
        return SlashCommand::Usage(NOTE_USAGE);
    }

    if let Some(args) = rest.strip_prefix("remove ") {
        return match args.trim().rsplit_once(char::is_whitespace) {
            Some((subject, id)) if !subject.trim().is_empty() => SlashCommand::NoteRemove {
                subject: subject.trim().to_string(),
                id: id.to_string(),
            },
            _ => SlashCommand::Usage(NOTE_USAGE),
        };
    }

    SlashCommand::Note(rest.to_string())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_slash_command, SlashCommand, NOTE_USAGE, SUBJECT_USAGE};

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("what is a prime?"), None);
        assert_eq!(parse_slash_command("  "), None);
    }

    #[test]
    fn bare_commands_parse() {
        assert_eq!(parse_slash_command(" /help "), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("/subjects"), Some(SlashCommand::Subjects));
        assert_eq!(parse_slash_command("/history"), Some(SlashCommand::History));
        assert_eq!(parse_slash_command("/clear"), Some(SlashCommand::Clear));
        assert_eq!(parse_slash_command("/quit"), Some(SlashCommand::Quit));
        assert_eq!(parse_slash_command("/notes"), Some(SlashCommand::Notes(None)));
    }

    #[test]
    fn subject_commands_keep_multi_word_names() {
        assert_eq!(
            parse_slash_command("/subject add World History"),
            Some(SlashCommand::SubjectAdd("World History".to_string()))
        );
        assert_eq!(
            parse_slash_command("/subject use   math"),
            Some(SlashCommand::SubjectUse("math".to_string()))
        );
        assert_eq!(
            parse_slash_command("/subject remove Science"),
            Some(SlashCommand::SubjectRemove("Science".to_string()))
        );
        assert_eq!(
            parse_slash_command("/subject add"),
            Some(SlashCommand::Usage(SUBJECT_USAGE))
        );
        assert_eq!(
            parse_slash_command("/subject rename A"),
            Some(SlashCommand::Usage(SUBJECT_USAGE))
        );
    }

    #[test]
    fn note_commands_distinguish_text_from_removal() {
        assert_eq!(
            parse_slash_command("/note remember the chain rule"),
            Some(SlashCommand::Note("remember the chain rule".to_string()))
        );
        assert_eq!(
            parse_slash_command("/note remove World History 2026-10-18T09:00:00Z"),
            Some(SlashCommand::NoteRemove {
                subject: "World History".to_string(),
                id: "2026-10-18T09:00:00Z".to_string(),
            })
        );
        assert_eq!(
            parse_slash_command("/note remove onlyid"),
            Some(SlashCommand::Usage(NOTE_USAGE))
        );
        assert_eq!(parse_slash_command("/note"), Some(SlashCommand::Usage(NOTE_USAGE)));
        assert_eq!(
            parse_slash_command("/notes Cell"),
            Some(SlashCommand::Notes(Some("Cell".to_string())))
        );
    }

    #[test]
    fn unknown_commands_are_reported_by_name() {
        assert_eq!(
            parse_slash_command("/teleport now"),
            Some(SlashCommand::Unknown("/teleport".to_string()))
        );
    }
}
