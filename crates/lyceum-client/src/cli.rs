//! Line commands of the terminal front-end.

use std::fmt::Write as _;

use thiserror::Error;

use lyceum_shared::types::{MessageId, NotificationId, UserId};
use lyceum_store::Conversation;

use crate::error::Result;
use crate::events::{EventReceiver, ToastKind, UiEvent};
use crate::session::MessagingModule;
use crate::view::{format_timestamp, render_conversation};

pub const HELP: &str = "\
Commands:
  inbox                    show conversations
  notifications            show notifications
  refresh                  fetch inbox and notifications
  sent                     show sent messages
  thread <userId>          show the conversation with a user
  show <messageId>         show one message
  send <userId> <text>     send a message
  reply <username> <text>  reply to a user by name
  students                 list students you can message (teachers)
  read <id>                mark a notification read
  unread <id>              mark a notification unread
  delete <id>              delete a notification
  read-all                 mark every notification read
  help                     show this help
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Inbox,
    Notifications,
    Refresh,
    Sent,
    Thread(UserId),
    Show(MessageId),
    Send { to: UserId, text: String },
    Reply { username: String, text: String },
    Students,
    Read(NotificationId),
    Unread(NotificationId),
    Delete(NotificationId),
    ReadAll,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid id")]
    InvalidId(String),
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

fn parse_id(arg: &str, usage: &'static str) -> std::result::Result<i64, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    arg.parse::<i64>()
        .map_err(|_| CommandError::InvalidId(arg.to_string()))
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> std::result::Result<Option<Command>, CommandError> {
    let (word, rest) = split_word(line);
    if word.is_empty() {
        return Ok(None);
    }

    let command = match word.to_ascii_lowercase().as_str() {
        "inbox" => Command::Inbox,
        "notifications" => Command::Notifications,
        "refresh" => Command::Refresh,
        "sent" => Command::Sent,
        "thread" => Command::Thread(UserId(parse_id(rest.trim(), "thread <userId>")?)),
        "show" => Command::Show(MessageId(parse_id(rest.trim(), "show <messageId>")?)),
        "send" => {
            let usage = "send <userId> <text>";
            let (id, text) = split_word(rest);
            Command::Send {
                to: UserId(parse_id(id, usage)?),
                text: text.to_string(),
            }
        }
        "reply" => {
            let (username, text) = split_word(rest);
            if username.is_empty() {
                return Err(CommandError::Usage("reply <username> <text>"));
            }
            Command::Reply {
                username: username.to_string(),
                text: text.to_string(),
            }
        }
        "students" => Command::Students,
        "read" => Command::Read(NotificationId(parse_id(rest.trim(), "read <id>")?)),
        "unread" => Command::Unread(NotificationId(parse_id(rest.trim(), "unread <id>")?)),
        "delete" => Command::Delete(NotificationId(parse_id(rest.trim(), "delete <id>")?)),
        "read-all" => Command::ReadAll,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn print_conversations(me: Option<UserId>, conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return "(no messages)".to_string();
    }
    conversations
        .iter()
        .map(|c| render_conversation(me, c).to_string())
        .collect::<Vec<_>>()
        .join("")
}

/// Run `command` against `module` and return the text to print.
///
/// Mutations print nothing themselves: their outcome arrives as UI events.
pub async fn dispatch(module: &MessagingModule, command: Command) -> Result<Option<String>> {
    let me = module.identity().await.ok().map(|i| i.user_id);
    let output = match command {
        Command::Inbox => Some(module.view().await.to_string()),
        Command::Notifications => {
            let view = module.view().await;
            let mut out = format!("Notifications ({})\n", view.badge_label());
            for n in &view.notifications {
                let _ = writeln!(out, "  {n}");
            }
            Some(out)
        }
        Command::Refresh => {
            module.refresh().await?;
            None
        }
        Command::Sent => Some(print_conversations(me, &module.sent().await?)),
        Command::Thread(counterpart) => Some(print_conversations(
            me,
            &[module.thread(counterpart).await?],
        )),
        Command::Show(id) => {
            let m = module.message(id).await?;
            Some(format!(
                "#{} [{}] from {} (#{}) to #{}:\n  {}",
                m.id,
                format_timestamp(&m.timestamp),
                m.sender_username,
                m.sender_id,
                m.receiver_id,
                m.content
            ))
        }
        Command::Send { to, text } => {
            module.composer().set_draft(text.clone());
            module.send(to, &text).await?;
            None
        }
        Command::Reply { username, text } => {
            module.composer().set_draft(text.clone());
            module.reply(&username, &text).await?;
            None
        }
        Command::Students => {
            let recipients = module.recipients().await?;
            if recipients.is_empty() {
                Some("(no students)".to_string())
            } else {
                let mut out = String::new();
                for (username, id) in &recipients {
                    let _ = writeln!(out, "  {username} (#{id})");
                }
                Some(out)
            }
        }
        Command::Read(id) => {
            module.toggle(id, true).await?;
            None
        }
        Command::Unread(id) => {
            module.toggle(id, false).await?;
            None
        }
        Command::Delete(id) => {
            module.delete_notification(id).await?;
            None
        }
        Command::ReadAll => {
            module.mark_all_read().await?;
            None
        }
        Command::Help => Some(HELP.to_string()),
        Command::Quit => None,
    };
    Ok(output)
}

/// Terminal rendering of a UI event. Events with no textual form yield
/// `None`.
pub fn describe(event: &UiEvent) -> Option<String> {
    match event {
        UiEvent::IdentityResolved { identity } => Some(format!(
            "Signed in as {} ({}, user #{})",
            identity.username, identity.role, identity.user_id
        )),
        UiEvent::SessionHalted { reason } => Some(format!("Messaging unavailable: {reason}")),
        UiEvent::Rendered { view } => Some(format!("Inbox updated ({})", view.badge_label())),
        UiEvent::Toast { kind, text, .. } => Some(match kind {
            ToastKind::Success => format!("OK: {text}"),
            ToastKind::Error => format!("ERROR: {text}"),
        }),
        UiEvent::ValidationFailed { reason } => Some(format!("Not sent: {reason}")),
        UiEvent::Alert { text } => Some(format!("ALERT: {text}")),
        UiEvent::Busy { active: true } => Some("Sending...".to_string()),
        UiEvent::Busy { active: false }
        | UiEvent::ControlDisabled { .. }
        | UiEvent::ControlEnabled { .. }
        | UiEvent::ToastDismissed { .. }
        | UiEvent::DraftCleared => None,
    }
}

/// Write every describable event to `out` until the channel closes.
pub async fn print_events<W: std::io::Write>(mut rx: EventReceiver, mut out: W) {
    while let Some(event) = rx.recv().await {
        if let Some(line) = describe(&event) {
            if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::InboxView;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("inbox"), Ok(Some(Command::Inbox)));
        assert_eq!(parse("  Notifications "), Ok(Some(Command::Notifications)));
        assert_eq!(parse("read-all"), Ok(Some(Command::ReadAll)));
        assert_eq!(parse("Students"), Ok(Some(Command::Students)));
        assert_eq!(parse("exit"), Ok(Some(Command::Quit)));
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse("thread 7"), Ok(Some(Command::Thread(UserId(7)))));
        assert_eq!(parse("show 11"), Ok(Some(Command::Show(MessageId(11)))));
        assert_eq!(
            parse("delete 5"),
            Ok(Some(Command::Delete(NotificationId(5))))
        );
        assert_eq!(
            parse("read x"),
            Err(CommandError::InvalidId("x".to_string()))
        );
        assert_eq!(parse("unread"), Err(CommandError::Usage("unread <id>")));
    }

    #[test]
    fn test_parse_send_keeps_text() {
        assert_eq!(
            parse("send 7 see you  at 9"),
            Ok(Some(Command::Send {
                to: UserId(7),
                text: "see you  at 9".to_string(),
            }))
        );
        // empty text is left to the composer to reject
        assert_eq!(
            parse("send 7"),
            Ok(Some(Command::Send {
                to: UserId(7),
                text: String::new(),
            }))
        );
        assert_eq!(parse("send"), Err(CommandError::Usage("send <userId> <text>")));
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            parse("reply maria thanks!"),
            Ok(Some(Command::Reply {
                username: "maria".to_string(),
                text: "thanks!".to_string(),
            }))
        );
        assert_eq!(parse("reply"), Err(CommandError::Usage("reply <username> <text>")));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse("archive 3"),
            Err(CommandError::Unknown("archive".to_string()))
        );
    }

    #[tokio::test]
    async fn test_students_lists_recipients() {
        use std::sync::Arc;
        use std::time::Duration;

        use lyceum_shared::protocol::StudentRef;
        use lyceum_shared::types::{ClassroomId, Role};

        use crate::config::ClientConfig;
        use crate::events::UiEvents;
        use crate::testing::FakeSchool;

        let fake = Arc::new(FakeSchool::new());
        fake.classroom_students.lock().unwrap().extend([
            (
                ClassroomId(4),
                vec![StudentRef {
                    username: "nikos".into(),
                    id: UserId(9),
                }],
            ),
            (
                ClassroomId(5),
                vec![StudentRef {
                    username: "eleni".into(),
                    id: UserId(11),
                }],
            ),
        ]);
        let config = ClientConfig {
            role: Role::Teacher,
            ..ClientConfig::default()
        };
        let (events, _rx) = UiEvents::channel(Duration::from_millis(10));
        let module = MessagingModule::new(fake, &config, events);

        let out = dispatch(&module, Command::Students).await.unwrap().unwrap();
        assert_eq!(out, "  eleni (#11)\n  nikos (#9)\n");
    }

    #[tokio::test]
    async fn test_halt_notice_reaches_output_after_failed_start() {
        use std::sync::Arc;
        use std::time::Duration;

        use crate::config::ClientConfig;
        use crate::events::UiEvents;
        use crate::testing::FakeSchool;

        let fake = Arc::new(FakeSchool::new());
        *fake.student.lock().unwrap() = None;
        let (events, rx) = UiEvents::channel(Duration::from_millis(10));
        let module = MessagingModule::new(fake, &ClientConfig::default(), events);
        assert!(module.start().await.is_err());
        drop(module);

        // dropping the module closes the channel, so the printer finishes
        let mut out = Vec::new();
        tokio::time::timeout(Duration::from_millis(200), print_events(rx, &mut out))
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Messaging unavailable: Identity unavailable (current user lookup)"));
    }

    #[test]
    fn test_describe_events() {
        let toast = UiEvent::Toast {
            id: 1,
            kind: ToastKind::Error,
            text: "Failed to send message".into(),
        };
        assert_eq!(describe(&toast).as_deref(), Some("ERROR: Failed to send message"));
        assert_eq!(
            describe(&UiEvent::Rendered {
                view: InboxView::default()
            })
            .as_deref(),
            Some("Inbox updated (no unread notifications)")
        );
        assert_eq!(describe(&UiEvent::DraftCleared), None);
    }
}
