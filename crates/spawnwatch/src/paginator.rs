//! Packing of board rows into size-limited pages, and splitting of long text
//! into message-sized pieces.

/// Total characters allowed in one rich page.
pub const PAGE_CAPACITY: usize = 6000;
/// Characters allowed in one column field.
pub const FIELD_CAPACITY: usize = 1024;
/// Characters allowed in one plain message.
pub const MESSAGE_CAPACITY: usize = 2000;
/// Fields per rich message when splitting free text.
pub const FIELDS_PER_MESSAGE: usize = 5;
/// Labels longer than this are abbreviated.
pub const MAX_LABEL_CHARS: usize = 40;

/// Column titles of the first block of a board.
pub const HEADERS: [&str; 3] = ["Enemy", "Up Time", "Up Now?"];
/// Title used for continuation blocks and fields.
pub const BLANK_TITLE: &str = "\u{200b}";

const CODE_FENCE: &str = "```";

/// One rendered line of the board, split into its three columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    pub name: String,
    pub status: String,
    pub probability: String,
}

impl BoardRow {
    fn cost(&self) -> (usize, usize, usize) {
        (
            chars(&self.name) + 1,
            chars(&self.status) + 1,
            chars(&self.probability) + 1,
        )
    }
}

/// A titled text field of a rich message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub title: String,
    pub body: String,
}

/// Consecutive rows rendered as one set of three column fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub headed: bool,
    pub rows: Vec<BoardRow>,
}

impl Block {
    /// The block as three fields: names, statuses, probabilities.
    pub fn fields(&self) -> [Field; 3] {
        let titles = if self.headed {
            HEADERS
        } else {
            [BLANK_TITLE; 3]
        };
        let column = |pick: fn(&BoardRow) -> &str| {
            self.rows.iter().map(pick).collect::<Vec<_>>().join("\n")
        };
        [
            Field {
                title: titles[0].to_string(),
                body: column(|row| row.name.as_str()),
            },
            Field {
                title: titles[1].to_string(),
                body: column(|row| row.status.as_str()),
            },
            Field {
                title: titles[2].to_string(),
                body: column(|row| row.probability.as_str()),
            },
        ]
    }
}

/// One rich message worth of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn fields(&self) -> Vec<Field> {
        self.blocks.iter().flat_map(|block| block.fields()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.blocks.iter().map(|block| block.rows.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page: usize,
    pub field: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            page: PAGE_CAPACITY,
            field: FIELD_CAPACITY,
        }
    }
}

/// Pack rows, in order, into pages.
///
/// Single streaming pass: a row that would push the page total over its cap
/// starts a new page; one that would push the name or status column over its
/// cap starts a new block on the same page. Only the first block of the
/// whole board carries column titles.
pub fn paginate(rows: Vec<BoardRow>, limits: PageLimits) -> Vec<Page> {
    let base: usize = HEADERS.iter().map(|title| chars(title)).sum();
    let mut pages = Vec::new();
    let mut page = Page::default();
    let mut current: Vec<BoardRow> = Vec::new();
    let mut headed = true;
    let mut page_total = base;
    let mut name_total = 0;
    let mut status_total = 0;

    for row in rows {
        let (name_cost, status_cost, probability_cost) = row.cost();
        let row_cost = name_cost + status_cost + probability_cost;
        page_total += row_cost;
        name_total += name_cost + 1;
        status_total += status_cost + 1;

        let new_page = page_total >= limits.page;
        let new_block = new_page || name_total.max(status_total) >= limits.field;
        if new_block && !current.is_empty() {
            page.blocks.push(Block {
                headed,
                rows: std::mem::take(&mut current),
            });
            headed = false;
        }
        if new_page {
            if !page.blocks.is_empty() {
                pages.push(std::mem::take(&mut page));
            }
            page_total = row_cost;
        }
        if new_block {
            name_total = name_cost;
            status_total = status_cost;
        }
        current.push(row);
    }

    if !current.is_empty() {
        page.blocks.push(Block {
            headed,
            rows: current,
        });
    }
    if !page.blocks.is_empty() {
        pages.push(page);
    }
    pages
}

/// Shorten a label longer than [`MAX_LABEL_CHARS`] to head + "..." + tail.
pub fn abbreviate(label: &str) -> String {
    let count = chars(label);
    if count <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(9).collect();
    let tail: String = label.chars().skip(count - 8).collect();
    format!("{head}...{tail}")
}

/// Split multi-line text into rich messages of titled fields.
///
/// Lines are packed greedily into fields of at most `field_capacity` chars,
/// at most `per_message` fields per message. Only the very first field is
/// titled `title`.
pub fn split_fields(
    text: &str,
    title: &str,
    field_capacity: usize,
    per_message: usize,
) -> Vec<Vec<Field>> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut messages = Vec::new();
    let mut title = title.to_string();
    let mut i = 0;
    while i < lines.len() {
        let mut fields = Vec::new();
        while fields.len() < per_message.max(1) && i < lines.len() {
            let (next, chunk) = take_lines(&lines, i, field_capacity);
            i = next;
            fields.push(Field {
                title: std::mem::replace(&mut title, BLANK_TITLE.to_string()),
                body: chunk.join("\n"),
            });
        }
        messages.push(fields);
    }
    messages
}

/// Split a reply into plain messages of at most `capacity` chars on line
/// boundaries. A reply wrapped in a code block is re-fenced per piece.
pub fn chunk_message(text: &str, capacity: usize) -> Vec<String> {
    let code = text.starts_with("```\n") && text.ends_with("\n```") && text.len() >= 8;
    let capacity = if code { capacity.saturating_sub(8) } else { capacity };
    if chars(text) <= capacity {
        return vec![text.to_string()];
    }

    let body = if code { &text[4..text.len() - 4] } else { text };
    let lines: Vec<&str> = body.split('\n').collect();
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (next, piece) = take_lines(&lines, i, capacity);
        i = next;
        let mut parts = Vec::with_capacity(piece.len() + 2);
        if code {
            parts.push(CODE_FENCE);
        }
        parts.extend(piece);
        if code {
            parts.push(CODE_FENCE);
        }
        chunks.push(parts.join("\n"));
    }
    chunks
}

/// Greedily take lines starting at `start` while they fit in `capacity`.
/// Always takes at least one line so oversized lines still make progress.
fn take_lines<'a>(lines: &[&'a str], start: usize, capacity: usize) -> (usize, Vec<&'a str>) {
    let mut taken = Vec::new();
    let mut length = 0;
    let mut i = start;
    while i < lines.len() {
        let cost = chars(lines[i]) + 1;
        if !taken.is_empty() && length + cost > capacity {
            break;
        }
        taken.push(lines[i]);
        length += cost;
        i += 1;
    }
    (i, taken)
}

fn chars(text: &str) -> usize {
    text.chars().count()
}
