//! Conversion between LSP positions, byte offsets and Tree-sitter points.
//!
//! LSP uses 0-based (line, character) positions with UTF-16 encoding,
//! while Tree-sitter uses byte offsets and byte columns.

use lsp_types::Position;
use ropey::Rope;
use tree_sitter::Point;

/// Convert an LSP (line, character) pair to a byte offset.
///
/// Characters past the end of the line clamp to the line end.
pub fn offset_from_position(rope: &Rope, line: u32, character: u32) -> Option<usize> {
    let line = line as usize;
    if line >= rope.len_lines() {
        return None;
    }
    let line_start_char = rope.line_to_char(line);
    let line_slice = rope.line(line);
    let mut end = line_slice.len_chars();
    while end > 0 && matches!(line_slice.char(end - 1), '\n' | '\r') {
        end -= 1;
    }
    let slice = line_slice.slice(..end);
    let utf16_offset = (character as usize).min(slice.len_utf16_cu());
    let char_offset = slice.utf16_cu_to_char(utf16_offset);
    Some(rope.char_to_byte(line_start_char + char_offset))
}

/// Convert an LSP position to a Tree-sitter point (row, byte column).
pub fn point_from_position(rope: &Rope, position: Position) -> Option<Point> {
    let offset = offset_from_position(rope, position.line, position.character)?;
    let line_start = rope.line_to_byte(position.line as usize);
    Some(Point::new(position.line as usize, offset - line_start))
}

/// Convert a byte offset to an LSP position.
pub fn position_from_offset(rope: &Rope, offset: usize) -> Position {
    let offset = offset.min(rope.len_bytes());
    let char_index = rope.byte_to_char(offset);
    let line = rope.char_to_line(char_index);
    let line_start_char = rope.line_to_char(line);
    let character = rope.slice(line_start_char..char_index).len_utf16_cu();
    Position::new(line as u32, character as u32)
}
