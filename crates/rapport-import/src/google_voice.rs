//! Google Voice takeout (`Takeout/Voice/Calls/*.html`).
//!
//! Every HTML file is one thread. Its labels (`div.tags a[rel=tag]`) say what
//! it is; only one-to-one text threads carry messages. The owner appears in
//! these files only as an implied recipient, so the owner's phone is added
//! to every text thread as participant `Me`.

use std::{path::Path, sync::LazyLock};

use rapport_core::record::{SourceBatch, SourceTime};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::{Error, GOOGLE_VOICE, Result, Thread, files_with_extension, locate};

/// Display name given to the owner's phone.
pub const OWNER_DISPLAY_NAME: &str = "Me";

// ─── Thread classification ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
  Text,
  Voicemail,
  Missed,
  Received,
  Placed,
  Unknown,
}

impl ThreadKind {
  fn from_labels(labels: &[String]) -> Self {
    let has = |l: &str| labels.iter().any(|x| x == l);
    if has("Text") {
      ThreadKind::Text
    } else if has("Voicemail") {
      ThreadKind::Voicemail
    } else if has("Missed") {
      ThreadKind::Missed
    } else if has("Received") {
      ThreadKind::Received
    } else if has("Placed") {
      ThreadKind::Placed
    } else {
      ThreadKind::Unknown
    }
  }

  pub fn is_call(self) -> bool {
    matches!(
      self,
      ThreadKind::Voicemail | ThreadKind::Missed | ThreadKind::Received | ThreadKind::Placed
    )
  }
}

/// One parsed HTML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
  pub kind:     ThreadKind,
  pub is_group: bool,
  /// Present for one-to-one text threads only.
  pub thread:   Option<Thread>,
}

// ─── Selectors ───────────────────────────────────────────────────────────────

struct Selectors {
  tags:     Selector,
  tag:      Selector,
  chat_log: Selector,
  message:  Selector,
  sender:   Selector,
  tel:      Selector,
  time:     Selector,
  quote:    Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| {
  let s = |css: &str| Selector::parse(css).expect("static selector");
  Selectors {
    tags:     s("div.tags"),
    tag:      s(r#"a[rel="tag"]"#),
    chat_log: s("div.hChatLog"),
    message:  s("div.message"),
    sender:   s("cite.sender"),
    tel:      s("a.tel"),
    time:     s("abbr.dt"),
    quote:    s("q"),
  }
});

// ─── Parsing ─────────────────────────────────────────────────────────────────

fn text_of(el: ElementRef<'_>) -> String { el.text().collect::<String>().trim().to_owned() }

/// Parse one Google Voice HTML page.
///
/// `owner_phone` is the owner's `tel:+…` id, added to text threads as `Me`.
pub fn parse_page(html: &str, owner_phone: &str) -> ParsedPage {
  let sel = &*SELECTORS;
  let doc = Html::parse_document(html);

  let tag_blocks: Vec<_> = doc.select(&sel.tags).collect();
  if tag_blocks.len() > 1 {
    debug!(blocks = tag_blocks.len(), "more than one tag block; using the first");
  }
  let labels: Vec<String> = tag_blocks
    .first()
    .map(|b| b.select(&sel.tag).map(text_of).collect())
    .unwrap_or_default();

  let kind = ThreadKind::from_labels(&labels);
  if kind != ThreadKind::Text {
    return ParsedPage { kind, is_group: false, thread: None };
  }

  let is_group = doc
    .select(&sel.chat_log)
    .next()
    .is_some_and(|log| text_of(log).contains("Group conversation with"));
  if is_group {
    return ParsedPage { kind, is_group, thread: None };
  }

  // Recipients depend on every participant, so messages are addressed only
  // after the whole page has been read.
  let mut thread = Thread::default();
  let mut pending = Vec::new();
  for message in doc.select(&sel.message) {
    let tel = message
      .select(&sel.sender)
      .next()
      .and_then(|cite| cite.select(&sel.tel).next());
    let href = tel.and_then(|t| t.value().attr("href"));
    let when = message
      .select(&sel.time)
      .next()
      .and_then(|abbr| abbr.value().attr("title"));
    let quote = message.select(&sel.quote).next();

    let (Some(tel), Some(href), Some(when), Some(quote)) = (tel, href, when, quote) else {
      thread.malformed += 1;
      continue;
    };

    thread.add_participant(href, &text_of(tel));
    thread.add_participant(owner_phone, OWNER_DISPLAY_NAME);
    pending.push((href, text_of(quote), when));
  }
  for (sender, text, when) in pending {
    thread.push_message(sender, Some(text), SourceTime::Text(when.to_owned()));
  }

  ParsedPage { kind, is_group, thread: Some(thread) }
}

/// Fold one parsed page into `batch`, tallying what was not imported.
pub fn add_page(batch: &mut SourceBatch, page: ParsedPage) {
  match page {
    ParsedPage { thread: Some(thread), .. } => thread.append_to(batch),
    ParsedPage { is_group: true, .. } => batch.tally.group_threads += 1,
    ParsedPage { kind, .. } if kind.is_call() => batch.tally.call_records += 1,
    ParsedPage { kind: ThreadKind::Unknown, .. } => batch.tally.unknown += 1,
    ParsedPage { .. } => {}
  }
}

/// Read every HTML file of a Google Voice takeout.
///
/// `root` may be the takeout folder itself or any folder above
/// `Takeout/Voice/Calls`. At most `file_limit` files are read.
pub fn read_takeout(
  root: impl AsRef<Path>,
  owner_phone: &str,
  file_limit: Option<usize>,
) -> Result<SourceBatch> {
  let calls = locate(
    root.as_ref(),
    &[&["Takeout", "Voice", "Calls"], &["Voice", "Calls"], &["Calls"]],
  );
  let mut batch = SourceBatch::new(GOOGLE_VOICE);

  let files = files_with_extension(&calls, "html")?;
  for path in files.into_iter().take(file_limit.unwrap_or(usize::MAX)) {
    let html = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    batch.tally.files += 1;

    let page = parse_page(&html, owner_phone);
    if page.kind == ThreadKind::Unknown {
      warn!(file = %path.display(), "unrecognised Google Voice thread");
    }
    add_page(&mut batch, page);
  }

  Ok(batch)
}

#[cfg(test)]
mod tests {
  use super::*;

  const OWNER: &str = "tel:+13195550134";

  fn page(tags: &str, body: &str) -> String {
    format!(
      r#"<html><body>
<div class="hChatLog hfeed">{body}</div>
<div class="tags">Labels: {tags}</div>
</body></html>"#
    )
  }

  fn message(tel: &str, name: &str, when: &str, text: &str) -> String {
    format!(
      r#"<div class="message"><abbr class="dt" title="{when}">Jun 5</abbr>:
<cite class="sender vcard"><a class="tel" href="{tel}"><span class="fn">{name}</span></a></cite>:
<q>{text}</q></div>"#
    )
  }

  fn tag(label: &str) -> String { format!(r#"<a rel="tag" href="http://www.google.com/voice#{label}">{label}</a>"#) }

  #[test]
  fn text_thread_gets_owner_as_recipient() {
    let html = page(
      &tag("Text"),
      &(message("tel:+15551234567", "Jane Doe", "2013-06-05T19:45:48.000-05:00", "hey")
        + &message(OWNER, "Me", "2013-06-05T19:46:10.000-05:00", "hi back")),
    );

    let parsed = parse_page(&html, OWNER);
    assert_eq!(parsed.kind, ThreadKind::Text);
    let thread = parsed.thread.unwrap();

    assert_eq!(thread.participants.len(), 2);
    assert_eq!(thread.participants[0].display_name.as_deref(), Some("Jane Doe"));
    assert_eq!(thread.participants[1].id_string, OWNER);

    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[0].recipient, OWNER);
    assert_eq!(thread.messages[0].text.as_deref(), Some("hey"));
    assert_eq!(thread.messages[1].sender, OWNER);
    assert_eq!(thread.messages[1].recipient, "tel:+15551234567");
    assert_eq!(
      thread.messages[0].timestamp,
      SourceTime::Text("2013-06-05T19:45:48.000-05:00".into())
    );
  }

  #[test]
  fn owner_first_thread_addresses_the_other_party() {
    let html = page(
      &tag("Text"),
      &(message(OWNER, "Me", "2013-06-05T19:45:00.000-05:00", "you around?")
        + &message(OWNER, "Me", "2013-06-05T19:45:30.000-05:00", "hello?")
        + &message("tel:+15551234567", "Jane Doe", "2013-06-05T19:46:10.000-05:00", "yes")),
    );

    let thread = parse_page(&html, OWNER).thread.unwrap();
    assert_eq!(thread.participants[0].id_string, OWNER);
    assert_eq!(thread.participants[1].id_string, "tel:+15551234567");

    assert_eq!(thread.messages.len(), 3);
    assert_eq!(thread.messages[0].sender, OWNER);
    assert_eq!(thread.messages[0].recipient, "tel:+15551234567");
    assert_eq!(thread.messages[1].recipient, "tel:+15551234567");
    assert_eq!(thread.messages[2].recipient, OWNER);
  }

  #[test]
  fn owner_only_thread_is_a_self_message() {
    let html = page(
      &tag("Text"),
      &message(OWNER, "Me", "2013-06-05T19:46:10.000-05:00", "note to self"),
    );
    let thread = parse_page(&html, OWNER).thread.unwrap();
    assert_eq!(thread.participants.len(), 1);
    assert_eq!(thread.messages[0].recipient, OWNER);
  }

  #[test]
  fn message_missing_sender_is_malformed() {
    let html = page(
      &tag("Text"),
      r#"<div class="message"><abbr class="dt" title="2013-06-05T19:45:48.000-05:00">x</abbr><q>orphan</q></div>"#,
    );
    let thread = parse_page(&html, OWNER).thread.unwrap();
    assert!(thread.messages.is_empty());
    assert_eq!(thread.malformed, 1);
  }

  #[test]
  fn group_threads_are_flagged() {
    let html = page(&tag("Text"), "Group conversation with: Jane, Bob");
    let parsed = parse_page(&html, OWNER);
    assert!(parsed.is_group);
    assert!(parsed.thread.is_none());
  }

  #[test]
  fn call_labels_classify() {
    for (label, kind) in [
      ("Voicemail", ThreadKind::Voicemail),
      ("Missed", ThreadKind::Missed),
      ("Received", ThreadKind::Received),
      ("Placed", ThreadKind::Placed),
    ] {
      let parsed = parse_page(&page(&tag(label), ""), OWNER);
      assert_eq!(parsed.kind, kind);
      assert!(parsed.thread.is_none());
    }
  }

  #[test]
  fn unlabelled_page_is_unknown() {
    let parsed = parse_page("<html><body><p>nothing</p></body></html>", OWNER);
    assert_eq!(parsed.kind, ThreadKind::Unknown);

    let mut batch = SourceBatch::new(GOOGLE_VOICE);
    add_page(&mut batch, parsed);
    assert_eq!(batch.tally.unknown, 1);
  }

  #[test]
  fn read_takeout_walks_calls_folder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let calls = dir.path().join("Takeout").join("Voice").join("Calls");
    std::fs::create_dir_all(&calls).unwrap();

    std::fs::write(
      calls.join("Jane Doe - Text - 2013-06-05.html"),
      page(
        &tag("Text"),
        &message("tel:+15551234567", "Jane Doe", "2013-06-05T19:45:48.000-05:00", "hey"),
      ),
    )
    .unwrap();
    std::fs::write(calls.join("Jane Doe - Missed - 2013-06-06.html"), page(&tag("Missed"), ""))
      .unwrap();
    std::fs::write(calls.join("notes.txt"), "ignored").unwrap();

    let batch = read_takeout(dir.path(), OWNER, None).unwrap();
    assert_eq!(batch.platform, GOOGLE_VOICE);
    assert_eq!(batch.tally.files, 2);
    assert_eq!(batch.tally.call_records, 1);
    assert_eq!(batch.messages.len(), 1);
    assert_eq!(batch.identities.len(), 2);

    let limited = read_takeout(dir.path(), OWNER, Some(1)).unwrap();
    assert_eq!(limited.tally.files, 1);
  }
}
