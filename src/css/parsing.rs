//! Stylesheet, declaration block and font-family list parsing.
//!
//! Built on cssparser's rule parsers. Values are kept as the source text of
//! their tokens, so strings, comments and nested blocks
//! (`url(data:...;...)`) never cut a declaration short.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
    parse_important,
};

use super::properties::PropertySet;
use super::stylesheet::{Selector, Stylesheet};

/// Parse a declaration block (`property: value; ...`).
///
/// Malformed declarations are skipped. Property names are lowercased and a
/// trailing `!important` is dropped.
pub fn parse_declarations(text: &str) -> PropertySet {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_declaration_list(&mut parser)
}

fn parse_declaration_list(input: &mut Parser<'_, '_>) -> PropertySet {
    let mut properties = PropertySet::new();
    let mut decl_parser = DeclarationListParser {
        properties: &mut properties,
    };
    for result in RuleBodyParser::new(input, &mut decl_parser) {
        if let Err((_, text)) = result {
            log::trace!("skipping declaration {:?}", text.trim());
        }
    }
    properties
}

/// Add the qualified rules of `css` to `sheet`.
///
/// At-rules are skipped. A selector list keeps the selectors it supports;
/// a rule with none of them is dropped.
pub(crate) fn parse_stylesheet(css: &str, sheet: &mut Stylesheet) {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rule_parser = TopLevelRuleParser { sheet };

    for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
        if let Err((_, text)) = result {
            log::debug!("skipping rule {:?}", text.trim());
        }
    }
}

/// Parse one simple selector (`tag`, `.class`, `tag.class`, `*.class`).
///
/// Whitespace inside the selector is a descendant combinator and fails the
/// parse, as does any other combinator, attribute or pseudo-class.
pub(crate) fn parse_simple_selector<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Selector, ParseError<'i, ()>> {
    input.skip_whitespace();
    let mut element = None;
    let mut class = None;
    let mut universal = false;

    loop {
        let location = input.current_source_location();
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Ident(tag) if element.is_none() && class.is_none() && !universal => {
                element = Some(tag.to_ascii_lowercase());
            }
            Token::Delim('*') if element.is_none() && class.is_none() && !universal => {
                universal = true;
            }
            Token::Delim('.') if class.is_none() => match input.next_including_whitespace()? {
                Token::Ident(name) => class = Some(name.to_string()),
                other => return Err(location.new_unexpected_token_error(other.clone())),
            },
            Token::WhiteSpace(_) => {
                input.expect_exhausted()?;
                break;
            }
            other => return Err(location.new_unexpected_token_error(other)),
        }
    }

    if element.is_none() && class.is_none() {
        return Err(input.new_custom_error(()));
    }
    Ok(Selector { element, class })
}

/// Parse a comma-separated selector list, dropping unsupported selectors.
fn parse_selector_list<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Vec<Selector>, ParseError<'i, ()>> {
    let selectors = input.parse_comma_separated(|input| -> Result<_, ParseError<'i, ()>> {
        let start = input.position();
        match input.try_parse(parse_simple_selector) {
            Ok(selector) => Ok(Some(selector)),
            Err(_) => {
                while input.next().is_ok() {}
                log::debug!(
                    "skipping unsupported selector {:?}",
                    input.slice_from(start).trim()
                );
                Ok(None)
            }
        }
    })?;
    let selectors: Vec<Selector> = selectors.into_iter().flatten().collect();
    if selectors.is_empty() {
        return Err(input.new_custom_error(()));
    }
    Ok(selectors)
}

/// Parser for top-level stylesheet rules.
struct TopLevelRuleParser<'a> {
    sheet: &'a mut Stylesheet,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        log::debug!("skipping @{} rule", &*name);
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<Selector>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let properties = parse_declaration_list(input);
        for selector in prelude {
            self.sheet.rule_mut(selector).merge(&properties);
        }
        Ok(())
    }
}

/// Collects declarations into a [`PropertySet`]; nested rules are rejected.
struct DeclarationListParser<'a> {
    properties: &'a mut PropertySet,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        let mut end = start;
        loop {
            let important = input.try_parse(|input| {
                parse_important(input)?;
                input.expect_exhausted()
            });
            if important.is_ok() || input.next().is_err() {
                break;
            }
            end = input.position();
        }

        let value = input.slice(start..end).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        self.properties.set(name.to_ascii_lowercase(), value);
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse a `font-family` list into individual family names.
///
/// Quoted names are taken verbatim; unquoted identifiers separated by spaces
/// are joined (`Times New Roman`).
pub fn parse_font_family(value: &str) -> Vec<String> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut families = Vec::new();
    let mut current = String::new();

    while let Ok(token) = parser.next() {
        match token {
            Token::QuotedString(name) => {
                current.clear();
                current.push_str(name);
            }
            Token::Ident(name) => {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(name);
            }
            Token::Comma => {
                if !current.trim().is_empty() {
                    families.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => {}
        }
    }
    if !current.trim().is_empty() {
        families.push(current.trim().to_string());
    }

    families
}
