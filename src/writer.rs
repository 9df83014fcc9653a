//! Indent-scoped line writer shared by all backends
//!
//! The writer knows nothing about target grammars: callers pass fully
//! punctuated keyword/expression strings and bracket pairs. Each nested
//! level is a new [`BlockWriter`] that appends to the same line sink.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct BlockWriter {
    ofs_indent: String,
    current: String,
    lines: Rc<RefCell<Vec<String>>>,
}

impl BlockWriter {
    /// Writer at indent level zero; `ofs_indent` is one indent step
    pub fn new(ofs_indent: impl Into<String>) -> Self {
        Self {
            ofs_indent: ofs_indent.into(),
            current: String::new(),
            lines: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Writer one level deeper, sharing this writer's lines
    pub fn indent(&self) -> BlockWriter {
        BlockWriter {
            ofs_indent: self.ofs_indent.clone(),
            current: format!("{}{}", self.current, self.ofs_indent),
            lines: Rc::clone(&self.lines),
        }
    }

    pub fn write_line(&self, line: impl AsRef<str>) {
        let line = format!("{}{}", self.current, line.as_ref());
        let mut lines = self.lines.borrow_mut();
        if line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(line);
        }
    }

    pub fn write_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.write_line(line);
        }
    }

    pub fn blank(&self) {
        self.lines.borrow_mut().push(String::new());
    }

    pub fn format_line(&self, args: fmt::Arguments<'_>) {
        self.write_line(args.to_string());
    }

    /// `keyword expression {`, body one level deeper, `}`
    pub fn write_block<F>(&self, keyword: &str, expression: &str, body: F)
    where
        F: FnOnce(&BlockWriter),
    {
        self.write_block_with(keyword, expression, " {", "}", body);
    }

    /// Block with custom open/close brackets
    pub fn write_block_with<F>(&self, keyword: &str, expression: &str, open: &str, close: &str, body: F)
    where
        F: FnOnce(&BlockWriter),
    {
        let keyword = keyword.trim();
        let expression = expression.trim();
        let space = if !keyword.is_empty() && !expression.is_empty() {
            " "
        } else {
            ""
        };
        self.write_line(format!("{keyword}{space}{expression}{open}"));
        body(&self.indent());
        self.write_line(close);
    }

    pub fn write_if<F>(&self, expression: &str, then: F)
    where
        F: FnOnce(&BlockWriter),
    {
        self.write_line(format!("if {} {{", expression));
        then(&self.indent());
        self.write_line("}");
    }

    pub fn write_if_else<F, G>(&self, expression: &str, then: F, otherwise: G)
    where
        F: FnOnce(&BlockWriter),
        G: FnOnce(&BlockWriter),
    {
        self.write_line(format!("if {} {{", expression));
        then(&self.indent());
        self.write_line("} else {");
        otherwise(&self.indent());
        self.write_line("}");
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// All lines, each terminated by a newline
    pub fn to_text(&self) -> String {
        let lines = self.lines.borrow();
        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// `wl!(w, "fmt", args..)` writes one formatted line
#[macro_export]
macro_rules! wl {
    ($w:expr, $($arg:tt)*) => {
        $w.format_line(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_blocks_share_sink() {
        let w = BlockWriter::new("  ");
        w.write_block("func", "main()", |w| {
            w.write_block("for", "i := 0; i < 3; i++", |w| {
                w.write_line("fmt.Println(i)");
            });
        });
        assert_eq!(
            w.to_text(),
            "func main() {\n  for i := 0; i < 3; i++ {\n    fmt.Println(i)\n  }\n}\n"
        );
    }

    #[test]
    fn test_block_trims_and_skips_space() {
        let w = BlockWriter::new("\t");
        w.write_block_with(" return ", "", "({", "});", |w| {
            w.write_line("a: 1,");
        });
        w.write_block_with("", "import", " {", "} from \"x\";", |w| w.write_line("A"));
        assert_eq!(
            w.lines(),
            vec!["return({", "\ta: 1,", "});", "import {", "\tA", "} from \"x\";"]
        );
    }

    #[test]
    fn test_whitespace_lines_become_empty() {
        let w = BlockWriter::new("    ").indent();
        w.write_line("   ");
        w.blank();
        w.write_line("x");
        assert_eq!(w.lines(), vec!["", "", "    x"]);
    }

    #[test]
    fn test_if_else() {
        let w = BlockWriter::new("  ");
        w.write_if_else("a < b", |w| w.write_line("return true"), |w| {
            w.write_if("a > b", |w| w.write_line("return false"));
        });
        wl!(w, "return {}", "false");
        assert_eq!(
            w.to_text(),
            "if a < b {\n  return true\n} else {\n  if a > b {\n    return false\n  }\n}\nreturn false\n"
        );
    }
}
