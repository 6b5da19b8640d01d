use unicode_width::UnicodeWidthStr;

use crate::model::Column;

/// Display width of `text` in terminal cells. Wide characters count as 2.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Right-pads `text` with spaces up to `width` cells.
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text_width(text));
    let mut out = String::with_capacity(text.len() + fill);
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

/// Widest column name and widest data type of one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    pub name: usize,
    pub data_type: usize,
}

impl ColumnWidths {
    pub fn measure(columns: &[&Column]) -> Self {
        columns.iter().fold(Self::default(), |acc, column| Self {
            name: acc.name.max(text_width(&column.name)),
            data_type: acc.data_type.max(text_width(&column.data_type)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(text_width("User"), 4);
    }

    #[test]
    fn test_unicode_width() {
        // 全角文字は幅2
        assert_eq!(text_width("ユーザー"), 8);
    }

    #[test]
    fn test_mixed_width() {
        // "User" (4) + "テスト" (6) = 10
        assert_eq!(text_width("Userテスト"), 10);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("id", 5), "id   ");
        assert_eq!(pad("email", 3), "email");
        assert_eq!(pad("名前", 6), "名前  ");
    }

    #[test]
    fn test_measure_columns() {
        let id = Column::new("c1", "t1", "id", "INT");
        let email = Column::new("c2", "t1", "email", "VARCHAR(255)");
        let widths = ColumnWidths::measure(&[&id, &email]);
        assert_eq!(widths, ColumnWidths { name: 5, data_type: 12 });
        assert_eq!(ColumnWidths::measure(&[]), ColumnWidths::default());
    }
}
