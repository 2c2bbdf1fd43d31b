use std::fmt::Write;

use ecochat_core::models::{MessageBody, timestamp};
use ecochat_core::{ChatThread, Message, Store};

pub fn thread_list(store: &Store) -> String {
    if store.is_empty() {
        return "No threads yet.".to_string();
    }

    let mut out = String::new();
    for thread in store.threads() {
        let marker = if store.active_thread_id() == Some(thread.id) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {id}  {title}  ({count} messages, {created})",
            id = thread.id,
            title = thread.title,
            count = thread.message_count(),
            created = timestamp::display(&thread.created_at),
        );
    }
    out
}

pub fn thread(thread: &ChatThread) -> String {
    let mut out = format!("# {} ({})\n", thread.title, thread.id);
    if thread.messages().is_empty() {
        out.push_str("\n(no messages)\n");
    }
    for message in thread.messages() {
        out.push('\n');
        out.push_str(&self::message(message));
    }
    out
}

/// One message as it appears in the terminal.
pub fn message(message: &Message) -> String {
    let mut out = String::new();
    match &message.body {
        MessageBody::User { content } => {
            let _ = writeln!(out, "you> {content}");
        }
        MessageBody::Assistant { content, sections } if sections.is_empty() => {
            let _ = writeln!(out, "eco> {content}");
        }
        MessageBody::Assistant { sections, .. } => {
            for (i, section) in sections.iter().enumerate() {
                let _ = writeln!(out, "eco> {}. {}", i + 1, section.title);
                for tip in &section.tips {
                    let _ = writeln!(out, "       - {tip}");
                }
            }
        }
        MessageBody::Image { prompt, image } => {
            let _ = writeln!(
                out,
                "eco> [image #{id}] {prompt} ({mime}, export with `ecochat export-image {id} <path>`)",
                id = message.id,
                mime = image.mime_type(),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecochat_core::models::{ImageRef, Section};

    #[test]
    fn test_assistant_sections_are_listed_with_tips() {
        let msg = Message::assistant(
            1,
            "raw",
            vec![Section {
                title: "Glass".into(),
                tips: vec!["Rinse jars".into()],
            }],
            timestamp::now(),
        );
        assert_eq!(message(&msg), "eco> 1. Glass\n       - Rinse jars\n");
    }

    #[test]
    fn test_unstructured_reply_prints_content() {
        let msg = Message::assistant(1, "Sorry.", Vec::new(), timestamp::now());
        assert_eq!(message(&msg), "eco> Sorry.\n");
    }

    #[test]
    fn test_image_points_at_export() {
        let msg = Message::image(7, "bins", ImageRef::from_bytes(&[0xFF, 0xD8, 0xFF], None), timestamp::now());
        let line = message(&msg);
        assert!(line.contains("[image #7] bins"));
        assert!(line.contains("image/jpeg"));
    }

    #[test]
    fn test_thread_list_marks_active() {
        let mut store = Store::new();
        let older = store.create_thread(Some("older"), timestamp::now());
        let newer = store.create_thread(Some("newer"), timestamp::now());
        store.set_active(older).unwrap();

        let listing = thread_list(&store);
        let lines: Vec<_> = listing.lines().collect();
        assert!(lines[0].starts_with(&format!("  {newer}  newer")));
        assert!(lines[1].starts_with(&format!("* {older}  older")));
    }
}
