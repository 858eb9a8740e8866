//! List numbering management for DOCX conversion

use docx_rs::*;

/// Deepest list level a numbering definition carries, zero based.
pub const MAX_LIST_LEVEL: usize = 8;

/// List numbering management for DOCX
///
/// Every list instance gets its own abstract numbering, so its counters start
/// from scratch. Definitions are collected while rendering and added to the
/// document at the end.
#[derive(Clone, Debug)]
pub struct DocxNumbering {
    next_id: usize,
    pending: Vec<(AbstractNumbering, Numbering)>,
}

impl Default for DocxNumbering {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxNumbering {
    /// Create a new numbering manager
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Create a list level with the specified parameters
    pub fn create_list_level(
        id: usize,
        start: usize,
        format: &str,
        text: &str,
        is_bullet: bool,
    ) -> Level {
        let indent_size = list_indent(id);
        let hanging_indent = if is_bullet { 360 } else { 420 };

        Level::new(
            id,
            Start::new(start),
            NumberFormat::new(format),
            LevelText::new(text),
            LevelJc::new("left"),
        )
        .indent(
            Some(indent_size),
            Some(SpecialIndentType::Hanging(hanging_indent)),
            None,
            None,
        )
    }

    /// Adds the collected definitions to the document.
    pub fn initialize_numbering(&mut self, mut docx: Docx) -> Docx {
        for (abstract_numbering, numbering) in self.pending.drain(..) {
            docx = docx
                .add_abstract_numbering(abstract_numbering)
                .add_numbering(numbering);
        }
        docx
    }

    /// Create a new ordered list numbering, counting from `start` on its
    /// first level.
    pub fn create_ordered_numbering(&mut self, start: usize) -> usize {
        let id = self.take_id();
        let mut ordered_abstract = AbstractNumbering::new(id);

        for i in 0..=MAX_LIST_LEVEL {
            let level_text = format!("%{}.", i + 1);
            let number_format = match i % 3 {
                0 => "decimal",
                1 => "lowerLetter",
                _ => "lowerRoman",
            };

            let level_start = if i == 0 { start } else { 1 };
            let mut ordered_level =
                Self::create_list_level(i, level_start, number_format, &level_text, false);

            if i > 0 {
                ordered_level = ordered_level.level_restart(0_u32);
            }

            ordered_abstract = ordered_abstract.add_level(ordered_level);
        }

        self.pending
            .push((ordered_abstract, Numbering::new(id, id)));
        id
    }

    /// Create a new unordered list numbering
    pub fn create_unordered_numbering(&mut self) -> usize {
        let id = self.take_id();
        let mut unordered_abstract = AbstractNumbering::new(id);

        for i in 0..=MAX_LIST_LEVEL {
            let bullet_text = match i % 3 {
                0 => "•",
                1 => "○",
                _ => "▪",
            };

            let unordered_level = Self::create_list_level(i, 1, "bullet", bullet_text, true);
            unordered_abstract = unordered_abstract.add_level(unordered_level);
        }

        self.pending
            .push((unordered_abstract, Numbering::new(id, id)));
        id
    }

    fn take_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Left indent in twips of a list paragraph at the given level.
pub fn list_indent(level: usize) -> i32 {
    720 * (level.min(MAX_LIST_LEVEL) + 1) as i32
}
