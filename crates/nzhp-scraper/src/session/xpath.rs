//! Translation of simple XPath location paths into CSS selectors.
//!
//! Supported: `/` and `//` axes, element names and `*`, positional `[n]`
//! (before any attribute predicate), `[@attr='v']`, `[contains(@attr, 'v')]`
//! and `and` between attribute tests. Anything else is rejected.

/// Compiles `xpath` into an equivalent CSS selector, or `None` if it uses
/// anything outside the supported subset.
#[must_use]
pub fn to_css(xpath: &str) -> Option<String> {
    let mut parser = Parser::new(xpath.trim());
    let mut css = String::new();
    let mut first = true;

    while !parser.at_end() {
        let descendant = if parser.eat_str("//") {
            true
        } else if parser.eat('/') {
            false
        } else {
            return None;
        };

        let step = parser.step()?;
        if first {
            css.push_str(&step);
            if !descendant {
                css.push_str(":root");
            }
            first = false;
        } else {
            css.push_str(if descendant { " " } else { " > " });
            css.push_str(&step);
        }
    }

    (!first).then_some(css)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let end = self.pos + s.chars().count();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().copied().eq(s.chars()) {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn name(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn literal(&mut self) -> Option<String> {
        let quote = self.peek().filter(|c| *c == '\'' || *c == '"')?;
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        let value: String = self.chars[start..self.pos].iter().collect();
        self.eat(quote).then_some(value)
    }

    fn step(&mut self) -> Option<String> {
        let (element, wildcard) = if self.eat('*') {
            ("*".to_string(), true)
        } else {
            (self.name()?, false)
        };

        let mut attrs = String::new();
        let mut position: Option<String> = None;

        while self.eat('[') {
            self.skip_ws();
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                if position.is_some() || !attrs.is_empty() {
                    return None;
                }
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n: u32 = digits.parse().ok().filter(|n| *n >= 1)?;
                position = Some(if wildcard {
                    format!(":nth-child({n})")
                } else {
                    format!(":nth-of-type({n})")
                });
            } else {
                loop {
                    attrs.push_str(&self.attribute_test()?);
                    self.skip_ws();
                    if !self.eat_str("and") {
                        break;
                    }
                    self.skip_ws();
                }
            }
            self.skip_ws();
            if !self.eat(']') {
                return None;
            }
        }

        Some(format!("{element}{attrs}{}", position.unwrap_or_default()))
    }

    fn attribute_test(&mut self) -> Option<String> {
        self.skip_ws();
        if self.eat('@') {
            let attr = self.name()?;
            self.skip_ws();
            if !self.eat('=') {
                return None;
            }
            self.skip_ws();
            let value = self.literal()?;
            Some(format!("[{attr}=\"{}\"]", escape(&value)))
        } else if self.eat_str("contains(") {
            self.skip_ws();
            if !self.eat('@') {
                return None;
            }
            let attr = self.name()?;
            self.skip_ws();
            if !self.eat(',') {
                return None;
            }
            self.skip_ws();
            let value = self.literal()?;
            self.skip_ws();
            if !self.eat(')') {
                return None;
            }
            Some(format!("[{attr}*=\"{}\"]", escape(&value)))
        } else {
            None
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendant_with_contains() {
        assert_eq!(
            to_css("//span[contains(@class, 'price-main')]").as_deref(),
            Some("span[class*=\"price-main\"]")
        );
    }

    #[test]
    fn contains_joined_with_and() {
        assert_eq!(
            to_css("//div[contains(@class, 'text-3xl') and contains(@class, 'font-bold')]")
                .as_deref(),
            Some("div[class*=\"text-3xl\"][class*=\"font-bold\"]")
        );
    }

    #[test]
    fn child_and_descendant_axes_with_positions() {
        assert_eq!(
            to_css("//div[@data-test='reinz-valuation__price-range']/div[2]//h4").as_deref(),
            Some("div[data-test=\"reinz-valuation__price-range\"] > div:nth-of-type(2) h4")
        );
    }

    #[test]
    fn wildcard_with_id_and_custom_elements() {
        assert_eq!(
            to_css(r#"//*[@id="content"]/div/homes-price-tag-simple[2]/span"#).as_deref(),
            Some("*[id=\"content\"] > div > homes-price-tag-simple:nth-of-type(2) > span")
        );
    }

    #[test]
    fn wildcard_position_uses_nth_child() {
        assert_eq!(to_css("//ul/*[3]").as_deref(), Some("ul > *:nth-child(3)"));
    }

    #[test]
    fn absolute_path_anchors_at_root() {
        assert_eq!(to_css("/html/body").as_deref(), Some("html:root > body"));
    }

    #[test]
    fn rejects_functions_outside_subset() {
        assert_eq!(to_css("//span[text()='Estimate']"), None);
        assert_eq!(to_css("//div[last()]"), None);
        assert_eq!(to_css("//a/@href"), None);
    }

    #[test]
    fn rejects_position_after_attribute_predicate() {
        assert_eq!(to_css("//div[@class='x'][2]"), None);
    }

    #[test]
    fn rejects_relative_and_empty_paths() {
        assert_eq!(to_css("div/span"), None);
        assert_eq!(to_css(""), None);
        assert_eq!(to_css("//"), None);
    }

    #[test]
    fn escapes_quotes_in_values() {
        assert_eq!(
            to_css(r#"//a[@title='say "hi"']"#).as_deref(),
            Some(r#"a[title="say \"hi\""]"#)
        );
    }
}
