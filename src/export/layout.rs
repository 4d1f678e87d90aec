//! Page Layout
//! Places text and image blocks top-to-bottom with a vertical cursor and
//! starts a new page whenever a block would cross the bottom margin.
//! All measurements are in points (1/72 inch).

/// Approximate glyph width as a fraction of the font size.
const AVG_CHAR_WIDTH: f64 = 0.5;
const LINE_SPACING: f64 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for PageGeometry {
    /// US Letter portrait with 0.75in margins.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 54.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Lowest y a block may reach.
    pub fn bottom_limit(&self) -> f64 {
        self.height - self.margin
    }

    pub fn chars_per_line(&self, font_size: f64) -> usize {
        ((self.content_width() / (font_size * AVG_CHAR_WIDTH)).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Text {
        text: String,
        font_size: f64,
        bold: bool,
    },
    /// Index into the document's image list
    Image { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content: BlockContent,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub blocks: Vec<Block>,
}

pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_SPACING
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub struct DocumentLayout {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor_y: f64,
}

impl DocumentLayout {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            cursor_y: geometry.margin,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bold line followed by half a line of space.
    pub fn heading(&mut self, text: &str, font_size: f64) {
        for line in wrap_text(text, self.geometry.chars_per_line(font_size)) {
            self.text_line(line, font_size, true);
        }
        self.spacer(font_size * 0.5);
    }

    pub fn line(&mut self, text: &str, font_size: f64) {
        self.text_line(text.to_string(), font_size, false);
    }

    /// Word-wrapped body text.
    pub fn paragraph(&mut self, text: &str, font_size: f64) {
        for line in wrap_text(text, self.geometry.chars_per_line(font_size)) {
            self.text_line(line, font_size, false);
        }
    }

    pub fn spacer(&mut self, height: f64) {
        self.cursor_y += height;
    }

    /// Full content width, height from the aspect ratio, capped at one page.
    pub fn image(&mut self, index: usize, aspect_ratio: f64) {
        let mut width = self.geometry.content_width();
        let mut height = width * aspect_ratio;
        if height > self.geometry.content_height() {
            height = self.geometry.content_height();
            width = height / aspect_ratio;
        }
        self.place(width, height, BlockContent::Image { index });
    }

    pub fn page_break(&mut self) {
        self.pages.push(Page::default());
        self.cursor_y = self.geometry.margin;
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }

    fn text_line(&mut self, text: String, font_size: f64, bold: bool) {
        self.place(
            self.geometry.content_width(),
            line_height(font_size),
            BlockContent::Text {
                text,
                font_size,
                bold,
            },
        );
    }

    fn place(&mut self, width: f64, height: f64, content: BlockContent) {
        let page_has_content = self
            .pages
            .last()
            .map(|p| !p.blocks.is_empty())
            .unwrap_or(false);
        if page_has_content && self.cursor_y + height > self.geometry.bottom_limit() {
            self.page_break();
        }

        let block = Block {
            x: self.geometry.margin,
            y: self.cursor_y,
            width,
            height,
            content,
        };
        self.cursor_y += height;
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("This period, DemoCo produced 1200 tCO2 emissions", 16);
        assert_eq!(
            lines,
            vec!["This period,", "DemoCo produced", "1200 tCO2", "emissions"]
        );
        assert!(lines.iter().all(|l| l.chars().count() <= 16));
    }

    #[test]
    fn splits_overlong_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn lines_advance_the_cursor() {
        let mut layout = DocumentLayout::new(PageGeometry::default());
        layout.line("one", 10.0);
        layout.line("two", 10.0);
        assert!((layout.cursor_y() - (54.0 + 28.0)).abs() < 1e-9);
        let pages = layout.finish();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks[1].y, 54.0 + 14.0);
    }

    #[test]
    fn breaks_page_before_crossing_bottom_margin() {
        let geometry = PageGeometry {
            width: 300.0,
            height: 200.0,
            margin: 20.0,
        };
        let mut layout = DocumentLayout::new(geometry);
        // 160pt of usable height, 14pt lines -> 11 lines per page
        for i in 0..12 {
            layout.line(&format!("line {}", i), 10.0);
        }
        let pages = layout.finish();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 11);
        assert_eq!(pages[1].blocks.len(), 1);
        assert_eq!(pages[1].blocks[0].y, 20.0);
        for page in &pages {
            for block in &page.blocks {
                assert!(block.y + block.height <= geometry.bottom_limit() + 1e-9);
            }
        }
    }

    #[test]
    fn tall_image_is_capped_to_the_page() {
        let mut layout = DocumentLayout::new(PageGeometry::default());
        layout.image(0, 3.0);
        let pages = layout.finish();
        let block = &pages[0].blocks[0];
        assert!((block.height - PageGeometry::default().content_height()).abs() < 1e-9);
        assert!(block.width < PageGeometry::default().content_width());
    }
}
