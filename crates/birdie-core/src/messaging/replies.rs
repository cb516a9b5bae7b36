//! Fixed user-facing reply texts and the quick-reply menus built on them.

use birdie_types::event::{Postback, UserAction};
use birdie_types::message::{OutboundMessage, QuickReply};
use birdie_types::portfolio::{DateKey, WorkEntry};
use birdie_types::session::WritingKind;
use birdie_types::skill::{Handedness, Skill};

/// Reply for anything the current conversation state does not expect.
pub const DEFAULT_REPLY: &str = "Please choose an item from the menu.";

/// The only error text users ever see.
pub const GENERIC_ERROR: &str = "An error occurred, please try again.";

pub const WELCOME: &str = "Welcome! Use the menu to analyze a practice video, \
write reflections, or browse your portfolio.";

pub const STILL_PROCESSING: &str =
    "Your previous video is still being processed. Please wait a moment.";

pub const SELECT_DATE_FIRST: &str = "Please select a date first.";

pub const NO_EXPERT_VIDEOS: &str = "No demonstration videos are available for this skill yet.";

pub const NO_SYLLABUS: &str = "The syllabus is not available yet.";

/// Maximum quick-reply buttons the messaging platform accepts per message.
pub const MAX_QUICK_REPLIES: usize = 13;

pub fn text(s: impl Into<String>) -> Vec<OutboundMessage> {
    vec![OutboundMessage::text(s)]
}

pub fn handedness_prompt(next: UserAction) -> Vec<OutboundMessage> {
    let replies = [Handedness::Right, Handedness::Left]
        .into_iter()
        .map(|handedness| QuickReply::Postback {
            label: handedness.label().to_string(),
            data: Postback::Handedness { handedness, next }.encode(),
        })
        .collect();
    vec![OutboundMessage::text("Which hand do you play with?").with_quick_replies(replies)]
}

pub fn skill_prompt(action: UserAction) -> Vec<OutboundMessage> {
    let question = match action {
        UserAction::AnalyzeVideo => "Which skill would you like analyzed?",
        UserAction::AddReflection => "Which skill would you like to add a reflection for?",
        UserAction::AddPreviewNote => "Which skill would you like to add a preview note for?",
        UserAction::ViewPortfolio => "Which skill's portfolio would you like to see?",
        UserAction::ViewExpertVideo => "Which skill would you like to watch?",
    };
    let replies = Skill::ALL
        .into_iter()
        .map(|skill| QuickReply::Postback {
            label: skill.label().to_string(),
            data: Postback::Action { action, skill }.encode(),
        })
        .collect();
    vec![OutboundMessage::text(question).with_quick_replies(replies)]
}

pub fn upload_prompt(skill: Skill) -> Vec<OutboundMessage> {
    vec![
        OutboundMessage::text(format!("Please upload a {} video.", skill.label()))
            .with_quick_replies(vec![
                QuickReply::Camera {
                    label: "Record".to_string(),
                },
                QuickReply::CameraRoll {
                    label: "Choose video".to_string(),
                },
            ]),
    ]
}

/// Date picker over a skill bucket, newest first.
pub fn date_prompt<'a>(
    kind: WritingKind,
    skill: Skill,
    entries: impl Iterator<Item = &'a WorkEntry>,
) -> Vec<OutboundMessage> {
    let mut dates: Vec<&DateKey> = entries.map(|e| &e.date_key).collect();
    dates.sort_by(|a, b| b.cmp(a));
    let replies = dates
        .into_iter()
        .take(MAX_QUICK_REPLIES)
        .map(|date| QuickReply::Postback {
            label: date.to_string(),
            data: Postback::SelectDate(date.clone()).encode(),
        })
        .collect();
    vec![
        OutboundMessage::text(format!(
            "Which {} video would you like to add a {} for?",
            skill.label(),
            kind.label()
        ))
        .with_quick_replies(replies),
    ]
}

pub fn no_entries(skill: Skill) -> Vec<OutboundMessage> {
    text(format!(
        "You have no {} videos yet. Analyze one first.",
        skill.label()
    ))
}

pub fn writing_prompt(kind: WritingKind, skill: Skill, date: &DateKey) -> Vec<OutboundMessage> {
    text(format!(
        "Please enter your {} for the {} video from {date}.",
        kind.label(),
        skill.label()
    ))
}

pub fn writing_saved(kind: WritingKind, skill: Skill, date: &DateKey) -> Vec<OutboundMessage> {
    text(format!(
        "Saved your {} for the {} video from {date}.",
        kind.label(),
        skill.label()
    ))
}

pub fn upload_complete(skill: Skill, folder_link: &str) -> Vec<OutboundMessage> {
    text(format!(
        "Your {} video has been analyzed and saved to your portfolio: {folder_link}",
        skill.label()
    ))
}

/// Text summary of every visible entry in a skill bucket, oldest first,
/// with one "watch" button per entry, newest first.
pub fn portfolio_summary<'a>(
    skill: Skill,
    entries: impl Iterator<Item = &'a WorkEntry>,
) -> Vec<OutboundMessage> {
    let visible: Vec<&WorkEntry> = entries.filter(|e| e.is_complete()).collect();
    if visible.is_empty() {
        return no_entries(skill);
    }

    let mut out = format!("{} portfolio", skill.label());
    for entry in &visible {
        out.push_str(&format!(
            "\n\n[{}] rating {:.1}\nAI notes:\n{}\nPreview note: {}\nReflection: {}",
            entry.date_key, entry.rating, entry.ai_note, entry.preview_note, entry.reflection,
        ));
    }

    let mut dates: Vec<&DateKey> = visible.iter().map(|e| &e.date_key).collect();
    dates.sort_by(|a, b| b.cmp(a));
    let replies = dates
        .into_iter()
        .take(MAX_QUICK_REPLIES)
        .map(|date| QuickReply::Postback {
            label: date.to_string(),
            data: Postback::ViewVideo {
                skill,
                date: date.clone(),
            }
            .encode(),
        })
        .collect();
    vec![OutboundMessage::text(out).with_quick_replies(replies)]
}

pub fn expert_videos(skill: Skill, links: &[String]) -> Vec<OutboundMessage> {
    if links.is_empty() {
        return text(NO_EXPERT_VIDEOS);
    }
    let mut out = format!("{} demonstration videos:", skill.label());
    for link in links {
        out.push('\n');
        out.push_str(link);
    }
    text(out)
}

/// Video message for a stored entry, previewed by its thumbnail.
///
/// Video messages need a JPEG or PNG preview. Entries without a thumbnail
/// use `placeholder`, or fall back to a plain link when none is configured.
pub fn video(entry: &WorkEntry, placeholder: Option<&str>) -> Vec<OutboundMessage> {
    let preview = if entry.thumbnail_ref.is_empty() {
        placeholder.filter(|p| !p.is_empty())
    } else {
        Some(entry.thumbnail_ref.as_str())
    };
    match preview {
        Some(preview) => vec![OutboundMessage::Video {
            url: entry.video_ref.clone(),
            preview_url: preview.to_string(),
        }],
        None => text(format!("Video from {}: {}", entry.date_key, entry.video_ref)),
    }
}
