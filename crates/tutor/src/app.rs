use std::io::{self, Write};

use tutor_api::CancellationSignal;
use tutor_store::StoreError;

use crate::assembler::SessionState;
use crate::commands::{parse_slash_command, SlashCommand};
use crate::relay::Relay;
use crate::runtime::ChatRuntime;

pub const HELP_TEXT: &str = "\
Commands:
  /help                          show this help
  /subjects                      list study subjects
  /subject add <name>            add a subject
  /subject remove <name>         remove a subject and its notes
  /subject use <name>            file new notes under a subject
  /note <text>                   save a note under the active subject
  /note remove <subject> <id>    delete a note
  /notes [query]                 list or search notes
  /history                       show the conversation
  /clear                         clear the conversation
  /quit                          leave
Anything else is sent to your tutor.";

const SAVE_FAILED: &str = "Kept for this session, but saving to disk failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end: routes input to commands or the tutor and
/// renders results to `out`.
pub struct TutorApp<R, W> {
    runtime: ChatRuntime<R>,
    out: W,
}

impl<R: Relay, W: Write> TutorApp<R, W> {
    pub fn new(runtime: ChatRuntime<R>, out: W) -> Self {
        Self { runtime, out }
    }

    #[must_use]
    pub fn runtime(&self) -> &ChatRuntime<R> {
        &self.runtime
    }

    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn greet(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "Tutor, your 24/7 learning companion (relay: {}). Type /help for commands.",
            self.runtime.relay().name()
        )?;
        let count = self.runtime.store().messages().len();
        if count > 0 {
            writeln!(self.out, "Resuming a conversation with {count} messages.")?;
        }
        self.out.flush()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        match self.runtime.store().active_subject() {
            Some(subject) => write!(self.out, "[{subject}] > ")?,
            None => write!(self.out, "> ")?,
        }
        self.out.flush()
    }

    pub fn farewell(&mut self) -> io::Result<()> {
        writeln!(self.out, "Goodbye!")?;
        self.out.flush()
    }

    pub async fn handle_line(
        &mut self,
        line: &str,
        cancellation: &CancellationSignal,
    ) -> io::Result<Flow> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Flow::Continue);
        }

        match parse_slash_command(trimmed) {
            Some(command) => self.run_command(command),
            None => {
                self.ask(line, cancellation).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn ask(&mut self, text: &str, cancellation: &CancellationSignal) -> io::Result<()> {
        let Self { runtime, out } = self;
        write!(out, "Tutor: ")?;
        out.flush()?;

        let mut write_error = None;
        let sent = runtime
            .send(text, cancellation, |fragment| {
                if write_error.is_some() {
                    return;
                }
                if let Err(error) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
                    write_error = Some(error);
                }
            })
            .await;
        if let Some(error) = write_error {
            return Err(error);
        }

        let Ok(report) = sent else {
            return writeln!(out);
        };
        match report.state {
            SessionState::Errored if report.used_fallback => writeln!(out, "{}", report.text)?,
            SessionState::Errored => writeln!(out, "\n(the reply was cut short)")?,
            SessionState::Cancelled => writeln!(out, "\n(stopped)")?,
            _ => writeln!(out)?,
        }
        out.flush()
    }

    fn run_command(&mut self, command: SlashCommand) -> io::Result<Flow> {
        let out = &mut self.out;
        let store = self.runtime.store_mut();

        match command {
            SlashCommand::Help => writeln!(out, "{HELP_TEXT}")?,
            SlashCommand::Subjects => {
                if store.subjects().is_empty() {
                    writeln!(out, "No subjects yet. Add one with /subject add <name>.")?;
                }
                for subject in store.subjects() {
                    let marker = if store.active_subject() == Some(subject.name.as_str()) {
                        '*'
                    } else {
                        ' '
                    };
                    writeln!(
                        out,
                        " {marker} {} [{}] {} notes",
                        subject.name,
                        subject.icon.as_str(),
                        store.notes_for(&subject.name).len()
                    )?;
                }
            }
            SlashCommand::SubjectAdd(name) => match store.add_subject(&name) {
                Ok(subject) => writeln!(out, "Added subject {}.", subject.name)?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::SubjectRemove(name) => match store.delete_subject(&name) {
                Ok(subject) => writeln!(out, "Removed subject {} and its notes.", subject.name)?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::SubjectUse(name) => match store.set_active_subject(&name) {
                Ok(subject) => writeln!(out, "Notes will be filed under {}.", subject.name)?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::Note(content) => match store.save_note(&content) {
                Ok(note) => writeln!(out, "Saved note {}.", note.id)?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::NoteRemove { subject, id } => match store.delete_note(&subject, &id) {
                Ok(note) => writeln!(out, "Removed note {}.", note.id)?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::Notes(query) => {
                let groups = store.search_notes(query.as_deref().unwrap_or(""));
                if groups.is_empty() {
                    writeln!(out, "No notes found.")?;
                }
                for group in groups {
                    writeln!(out, "{}:", group.subject)?;
                    for note in group.notes {
                        writeln!(out, "  [{}] {}", note.id, note.content)?;
                    }
                }
            }
            SlashCommand::History => {
                if store.messages().is_empty() {
                    writeln!(out, "No messages yet.")?;
                }
                for message in store.messages() {
                    let speaker = if message.is_user { "You" } else { "Tutor" };
                    writeln!(out, "[{}] {speaker}: {}", message.timestamp, message.text)?;
                }
            }
            SlashCommand::Clear => match store.clear_conversation() {
                Ok(()) => writeln!(out, "Conversation cleared.")?,
                Err(error) => report_store_error(out, &error)?,
            },
            SlashCommand::Quit => return Ok(Flow::Quit),
            SlashCommand::Usage(usage) => writeln!(out, "Usage: {usage}")?,
            SlashCommand::Unknown(command) => {
                writeln!(out, "Unknown command {command}. Type /help for commands.")?
            }
        }

        out.flush()?;
        Ok(Flow::Continue)
    }
}

fn report_store_error(out: &mut impl Write, error: &StoreError) -> io::Result<()> {
    if error.is_persistence() {
        tracing::warn!(%error, "snapshot write failed");
        writeln!(out, "{SAVE_FAILED}")
    } else {
        writeln!(out, "{error}")
    }
}
