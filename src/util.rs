/// Utility functions for the language server.
///
/// Position/offset conversion, the partial-word check used by completion,
/// and client logging.
use std::path::Path;

use tower_lsp::lsp_types::{MessageType, Position, Url};

use crate::Backend;

/// Convert an LSP position (line, UTF-16 column) to a byte offset in
/// `content`.
///
/// A column past the end of its line clamps to the line end (before the
/// newline); a line past the end of the buffer gives the buffer length.
pub fn position_to_offset(content: &str, position: Position) -> usize {
    let mut offset = 0;
    for (i, line) in content.split_inclusive('\n').enumerate() {
        if i == position.line as usize {
            let body = line.trim_end_matches(['\n', '\r']);
            let mut units = 0;
            for (idx, ch) in body.char_indices() {
                if units >= position.character as usize {
                    return offset + idx;
                }
                units += ch.len_utf16();
            }
            return offset + body.len();
        }
        offset += line.len();
    }
    content.len()
}

/// Whether the text before the cursor ends in the middle of a word.
pub fn ends_with_word(prefix: &str) -> bool {
    prefix
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// The `file://` URI string for `path`.
pub fn uri_for_path(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(|u| u.to_string())
}

impl Backend {
    /// Send a log message to the client, if connected.
    pub(crate) async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}
