// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error tolerant recursive descent parser. It always produces a tree covering the whole
//! input; the first problem it finds is reported next to the tree in
//! [`ParsedChunk::error`].

use crate::{BinaryOp, Keyword, Node, NodeKind, ParseError, ParsedChunk, Span, Token,
            TokenKind, tokenize_chars};

#[must_use]
pub fn parse(source: &str) -> ParsedChunk {
    let chars: Vec<char> = source.chars().collect();
    let tokens = tokenize_chars(&chars);
    let mut parser = Parser {
        chars: &chars,
        tokens,
        pos: 0,
        error: None,
    };
    let root = parser.parse_module();
    ParsedChunk {
        source: source.to_string(),
        root,
        error: parser.error,
    }
}

struct Parser<'a> {
    chars: &'a [char],
    tokens: Vec<Token>,
    pos: usize,
    error: Option<ParseError>,
}

impl Parser<'_> {
    // Token cursor helpers.

    fn peek(&self) -> Option<Token> { self.tokens.get(self.pos).copied() }

    fn peek_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let it = self.peek();
        if it.is_some() {
            self.pos += 1;
        }
        it
    }

    fn text(&self, span: Span) -> String {
        self.chars[span.start..span.end].iter().collect()
    }

    fn is_delimiter(&self, token: Option<Token>, expected: char) -> bool {
        token.is_some_and(|it| {
            it.kind == TokenKind::Delimiter && self.chars[it.span.start] == expected
        })
    }

    fn is_operator(&self, token: Option<Token>, expected: &str) -> bool {
        token.is_some_and(|it| it.kind == TokenKind::Operator && self.text(it.span) == expected)
    }

    fn is_keyword(&self, token: Option<Token>, expected: Keyword) -> bool {
        token.is_some_and(|it| {
            it.kind == TokenKind::Keyword && self.text(it.span) == expected.as_ref()
        })
    }

    fn at_separator(&self) -> bool {
        self.peek().is_some_and(|it| it.kind == TokenKind::Separator)
    }

    /// `}`, `)` or `]`: something that ends an enclosing construct.
    fn at_closer(&self) -> bool {
        self.is_delimiter(self.peek(), '}')
            || self.is_delimiter(self.peek(), ')')
            || self.is_delimiter(self.peek(), ']')
    }

    fn at_statement_end(&self) -> bool {
        self.peek().is_none() || self.at_separator() || self.at_closer()
    }

    fn report(&mut self, message: impl Into<String>, span: Span) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(message, span));
        }
    }

    fn eof_span(&self) -> Span { Span::new(self.chars.len(), self.chars.len()) }

    /// Extend `end` over spaces and tabs (not over line feeds).
    fn extend_over_horizontal_whitespace(&self, mut end: usize) -> usize {
        while end < self.chars.len() && matches!(self.chars[end], ' ' | '\t') {
            end += 1;
        }
        end
    }

    // Statements.

    fn parse_module(&mut self) -> Node {
        let statements = self.parse_statements(None);
        Node::new(NodeKind::Module { statements }, 0, self.chars.len())
    }

    fn parse_statements(&mut self, closer: Option<char>) -> Vec<Node> {
        let mut statements = vec![];
        loop {
            while self.at_separator() {
                self.advance();
            }
            let Some(token) = self.peek() else {
                if closer.is_some() {
                    self.report("unterminated block, expected `}`", self.eof_span());
                }
                break;
            };
            if let Some(closer) = closer
                && self.is_delimiter(Some(token), closer)
            {
                break;
            }
            if closer.is_none() && self.at_closer() {
                self.advance();
                self.report("unexpected closing delimiter", token.span);
                statements.push(self.invalid(token.span));
                continue;
            }

            let before = self.pos;
            let statement = self.parse_statement();
            statements.push(statement);

            if self.pos == before {
                // No progress, swallow the token so the loop terminates.
                self.advance();
                self.report("unexpected token", token.span);
                statements.push(self.invalid(token.span));
                continue;
            }

            if !self.at_statement_end() {
                let start = self.peek().map_or(self.chars.len(), |it| it.span.start);
                let mut end = start;
                while !self.at_statement_end() {
                    if let Some(it) = self.advance() {
                        end = it.span.end;
                    }
                }
                let span = Span::new(start, end);
                self.report("expected the end of the statement", span);
                statements.push(self.invalid(span));
            }
        }
        statements
    }

    fn invalid(&self, span: Span) -> Node {
        Node {
            span,
            kind: NodeKind::Invalid {
                text: self.text(span),
            },
        }
    }

    fn parse_statement(&mut self) -> Node {
        let Some(token) = self.peek() else {
            return self.invalid(self.eof_span());
        };

        if token.kind == TokenKind::Keyword {
            let text = self.text(token.span);
            match text.parse::<Keyword>() {
                Ok(Keyword::For) => return self.parse_for(),
                Ok(Keyword::Walk) => return self.parse_walk(),
                Ok(Keyword::If) => return self.parse_if(),
                Ok(Keyword::Init) => {
                    self.advance();
                    let body = self.parse_block();
                    let end = body.span.end;
                    return Node::new(
                        NodeKind::Initializer {
                            body: Box::new(body),
                        },
                        token.span.start,
                        end,
                    );
                }
                Ok(Keyword::Break) => {
                    self.advance();
                    return Node {
                        span: token.span,
                        kind: NodeKind::BreakStatement,
                    };
                }
                Ok(Keyword::Continue) => {
                    self.advance();
                    return Node {
                        span: token.span,
                        kind: NodeKind::ContinueStatement,
                    };
                }
                Ok(Keyword::Prune) => {
                    self.advance();
                    return Node {
                        span: token.span,
                        kind: NodeKind::PruneStatement,
                    };
                }
                Ok(Keyword::Return) => {
                    self.advance();
                    if self.at_statement_end() {
                        return Node {
                            span: token.span,
                            kind: NodeKind::ReturnStatement { value: None },
                        };
                    }
                    let value = self.parse_expression();
                    let end = value.span.end;
                    return Node::new(
                        NodeKind::ReturnStatement {
                            value: Some(Box::new(value)),
                        },
                        token.span.start,
                        end,
                    );
                }
                _ => return self.parse_expression(),
            }
        }

        let is_assignable = matches!(
            token.kind,
            TokenKind::Identifier | TokenKind::LocalVariable | TokenKind::GlobalVariable
        );
        if is_assignable && self.is_operator(self.peek_at(1), "=") {
            return self.parse_assignment();
        }

        if token.kind == TokenKind::Identifier {
            let next = self.peek_at(1);
            let is_adjacent = next.is_some_and(|it| it.span.start == token.span.end);
            let continues_as_expression = is_adjacent
                && (self.is_delimiter(next, '(') || self.is_delimiter(next, '.'));
            if !continues_as_expression {
                return self.parse_command_call();
            }
        }

        self.parse_expression()
    }

    fn parse_assignment(&mut self) -> Node {
        let target = self.parse_primary_atom();
        self.advance(); // `=`
        let value = if self.at_statement_end() {
            let span = self.peek().map_or(self.eof_span(), |it| it.span);
            self.report("expected a value after `=`", span);
            self.invalid(Span::new(span.start, span.start))
        } else {
            self.parse_expression()
        };
        let (start, end) = (target.span.start, value.span.end);
        Node::new(
            NodeKind::Assignment {
                target: Box::new(target),
                value: Box::new(value),
            },
            start,
            end,
        )
    }

    /// `cmd sub arg ..`. A lone identifier is just an identifier, unless it is followed by
    /// whitespace, in which case it is a call with no arguments yet.
    fn parse_command_call(&mut self) -> Node {
        let callee = self.parse_primary_atom();
        let callee_end = callee.span.end;

        let mut args = vec![];
        while !self.at_statement_end() {
            let before = self.pos;
            args.push(self.parse_primary());
            if self.pos == before {
                break;
            }
        }

        let last_end = args.last().map_or(callee_end, |it| it.span.end);
        let end = self.extend_over_horizontal_whitespace(last_end);
        if args.is_empty() && end == callee_end {
            return callee;
        }

        let start = callee.span.start;
        Node::new(
            NodeKind::Call {
                callee: Box::new(callee),
                args,
                is_parenthesized: false,
            },
            start,
            end,
        )
    }

    fn parse_for(&mut self) -> Node {
        let Some(for_token) = self.advance() else {
            return self.invalid(self.eof_span());
        };

        let mut binding = None;
        if let Some(it) = self.peek()
            && it.kind == TokenKind::Identifier
            && self.is_keyword(self.peek_at(1), Keyword::In)
        {
            binding = Some(self.text(it.span));
            self.advance();
            self.advance();
        }

        let iterable = self.parse_expression();
        let body = self.parse_block();
        let end = body.span.end.max(iterable.span.end);
        Node::new(
            NodeKind::ForStatement {
                binding,
                iterable: Box::new(iterable),
                body: Box::new(body),
            },
            for_token.span.start,
            end,
        )
    }

    fn parse_walk(&mut self) -> Node {
        let Some(walk_token) = self.advance() else {
            return self.invalid(self.eof_span());
        };

        let target = self.parse_expression();

        if self.is_delimiter(self.peek(), ',') {
            self.advance();
        } else {
            let span = self.peek().map_or(self.eof_span(), |it| it.span);
            self.report("expected `,` after the walk target", span);
        }

        let binding = match self.peek() {
            Some(it) if it.kind == TokenKind::Identifier => {
                self.advance();
                Node {
                    span: it.span,
                    kind: NodeKind::Identifier {
                        name: self.text(it.span),
                    },
                }
            }
            other => {
                let span = other.map_or(self.eof_span(), |it| Span::new(it.span.start, it.span.start));
                self.report("expected an identifier to bind each entry to", span);
                self.invalid(span)
            }
        };

        let body = self.parse_block();
        let end = body.span.end.max(binding.span.end);
        Node::new(
            NodeKind::WalkStatement {
                target: Box::new(target),
                binding: Box::new(binding),
                body: Box::new(body),
            },
            walk_token.span.start,
            end,
        )
    }

    fn parse_if(&mut self) -> Node {
        let Some(if_token) = self.advance() else {
            return self.invalid(self.eof_span());
        };

        let condition = self.parse_expression();
        let consequent = self.parse_block();
        let mut end = consequent.span.end.max(condition.span.end);

        let alternate = if self.is_keyword(self.peek(), Keyword::Else) {
            self.advance();
            let it = if self.is_keyword(self.peek(), Keyword::If) {
                self.parse_if()
            } else {
                self.parse_block()
            };
            end = it.span.end.max(end);
            Some(Box::new(it))
        } else {
            None
        };

        Node::new(
            NodeKind::IfStatement {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate,
            },
            if_token.span.start,
            end,
        )
    }

    fn parse_block(&mut self) -> Node {
        let Some(open) = self.peek().filter(|it| self.is_delimiter(Some(*it), '{')) else {
            let span = self.peek().map_or(self.eof_span(), |it| it.span);
            self.report("expected a block starting with `{`", span);
            let at = span.start;
            return Node::new(NodeKind::Block { statements: vec![] }, at, at);
        };
        self.advance();

        let statements = self.parse_statements(Some('}'));

        let end = if self.is_delimiter(self.peek(), '}') {
            self.advance().map_or(self.chars.len(), |it| it.span.end)
        } else {
            self.chars.len()
        };
        Node::new(NodeKind::Block { statements }, open.span.start, end)
    }

    // Expressions.

    fn parse_expression(&mut self) -> Node { self.parse_primary() }

    /// An atom followed by any `(args)` and `.prop` suffixes that are glued to it.
    fn parse_primary(&mut self) -> Node {
        let mut node = self.parse_primary_atom();

        loop {
            let next = self.peek();
            let is_glued = next.is_some_and(|it| it.span.start == node.span.end);
            if !is_glued {
                break;
            }
            if self.is_delimiter(next, '(') && matches!(node.kind, NodeKind::Identifier { .. }) {
                node = self.parse_parenthesized_call(node);
            } else if self.is_delimiter(next, '.') {
                node = self.parse_member_chain(node);
            } else {
                break;
            }
        }

        node
    }

    fn parse_parenthesized_call(&mut self, callee: Node) -> Node {
        self.advance(); // `(`
        let mut args = vec![];
        let end;
        loop {
            while self.at_separator() {
                self.advance();
            }
            if self.is_delimiter(self.peek(), ')') {
                end = self.advance().map_or(self.chars.len(), |it| it.span.end);
                break;
            }
            if self.peek().is_none() || self.at_closer() {
                self.report("unterminated call, expected `)`", self.eof_span());
                end = args.last().map_or(callee.span.end + 1, |it: &Node| it.span.end);
                break;
            }
            let before = self.pos;
            args.push(self.parse_expression());
            if self.is_delimiter(self.peek(), ',') {
                self.advance();
            }
            if self.pos == before {
                self.advance();
            }
        }
        let start = callee.span.start;
        Node::new(
            NodeKind::Call {
                callee: Box::new(callee),
                args,
                is_parenthesized: true,
            },
            start,
            end,
        )
    }

    /// `base.a.b`. A dangling `.` yields an empty property whose span sits right after
    /// the dot.
    fn parse_member_chain(&mut self, base: Node) -> Node {
        let start = base.span.start;
        let mut properties = vec![];
        let mut end = base.span.end;

        while let Some(dot) = self.peek()
            && self.is_delimiter(Some(dot), '.')
            && dot.span.start == end
        {
            self.advance();
            end = dot.span.end;
            match self.peek() {
                Some(it)
                    if matches!(it.kind, TokenKind::Identifier | TokenKind::Keyword)
                        && it.span.start == dot.span.end =>
                {
                    self.advance();
                    properties.push(Node {
                        span: it.span,
                        kind: NodeKind::Identifier {
                            name: self.text(it.span),
                        },
                    });
                    end = it.span.end;
                }
                _ => {
                    properties.push(Node::new(
                        NodeKind::Identifier {
                            name: String::new(),
                        },
                        end,
                        end,
                    ));
                    break;
                }
            }
        }

        Node::new(
            NodeKind::Member {
                base: Box::new(base),
                properties,
            },
            start,
            end,
        )
    }

    #[allow(clippy::too_many_lines)]
    fn parse_primary_atom(&mut self) -> Node {
        let Some(token) = self.peek() else {
            let span = self.eof_span();
            self.report("unexpected end of input", span);
            return self.invalid(span);
        };
        let span = token.span;
        let text = self.text(span);

        let kind = match token.kind {
            TokenKind::Identifier => NodeKind::Identifier { name: text },
            TokenKind::LocalVariable => NodeKind::LocalVariable {
                name: text.trim_start_matches('$').to_string(),
            },
            TokenKind::GlobalVariable => NodeKind::GlobalVariable {
                name: text.trim_start_matches('$').to_string(),
            },
            TokenKind::PatternName => NodeKind::PatternName {
                name: text.trim_start_matches('%').to_string(),
            },
            TokenKind::PathLiteral => NodeKind::PathLiteral { raw: text },
            TokenKind::UrlLiteral => NodeKind::UrlLiteral { raw: text },
            TokenKind::HostLiteral => NodeKind::HostLiteral { raw: text },
            TokenKind::SchemeLiteral => NodeKind::SchemeLiteral { raw: text },
            TokenKind::IntLiteral => match text.parse::<i64>() {
                Ok(value) => NodeKind::IntLiteral { value },
                Err(_) => {
                    self.report("integer literal out of range", span);
                    NodeKind::Invalid { text }
                }
            },
            TokenKind::StringLiteral => {
                if !is_terminated_string(&text) {
                    self.report("unterminated string literal", span);
                }
                NodeKind::StringLiteral {
                    value: unescape(&text),
                }
            }
            TokenKind::Keyword => match text.parse::<Keyword>() {
                Ok(Keyword::True) => NodeKind::BoolLiteral { value: true },
                Ok(Keyword::False) => NodeKind::BoolLiteral { value: false },
                Ok(Keyword::Nil) => NodeKind::NilLiteral,
                _ => {
                    self.report(format!("unexpected keyword `{text}`"), span);
                    NodeKind::Invalid { text }
                }
            },
            TokenKind::Delimiter if text == "[" => return self.parse_list(),
            TokenKind::Delimiter if text == "{" => return self.parse_object(),
            TokenKind::Delimiter if text == "(" => return self.parse_parenthesized(),
            TokenKind::Delimiter
            | TokenKind::Operator
            | TokenKind::Separator
            | TokenKind::Unknown => {
                self.report(format!("unexpected `{text}`"), span);
                NodeKind::Invalid { text }
            }
        };

        self.advance();
        Node { span, kind }
    }

    fn parse_list(&mut self) -> Node {
        let Some(open) = self.advance() else {
            return self.invalid(self.eof_span());
        };
        let mut elements = vec![];
        let end;
        loop {
            while self.at_separator() || self.is_delimiter(self.peek(), ',') {
                self.advance();
            }
            if self.is_delimiter(self.peek(), ']') {
                end = self.advance().map_or(self.chars.len(), |it| it.span.end);
                break;
            }
            if self.peek().is_none() || self.at_closer() {
                self.report("unterminated list, expected `]`", self.eof_span());
                end = elements.last().map_or(open.span.end, |it: &Node| it.span.end);
                break;
            }
            let before = self.pos;
            elements.push(self.parse_expression());
            if self.pos == before {
                self.advance();
            }
        }
        Node::new(NodeKind::ListLiteral { elements }, open.span.start, end)
    }

    fn parse_object(&mut self) -> Node {
        let Some(open) = self.advance() else {
            return self.invalid(self.eof_span());
        };
        let mut properties = vec![];
        let end;
        loop {
            while self.at_separator() || self.is_delimiter(self.peek(), ',') {
                self.advance();
            }
            if self.is_delimiter(self.peek(), '}') {
                end = self.advance().map_or(self.chars.len(), |it| it.span.end);
                break;
            }
            let Some(key_token) = self.peek().filter(|_| !self.at_closer()) else {
                self.report("unterminated object, expected `}`", self.eof_span());
                end = properties.last().map_or(open.span.end, |it: &Node| it.span.end);
                break;
            };

            let key = match key_token.kind {
                TokenKind::Identifier | TokenKind::Keyword => self.text(key_token.span),
                TokenKind::StringLiteral => unescape(&self.text(key_token.span)),
                _ => {
                    self.advance();
                    self.report("expected a property name", key_token.span);
                    properties.push(self.invalid(key_token.span));
                    continue;
                }
            };
            self.advance();

            if self.is_delimiter(self.peek(), ':') {
                self.advance();
            } else {
                let span = self.peek().map_or(self.eof_span(), |it| it.span);
                self.report("expected `:` after the property name", span);
            }

            let value = if self.is_delimiter(self.peek(), '}') || self.peek().is_none() {
                let at = self.peek().map_or(self.chars.len(), |it| it.span.start);
                self.report("expected a property value", Span::new(at, at));
                self.invalid(Span::new(at, at))
            } else {
                self.parse_expression()
            };

            let property_end = value.span.end.max(key_token.span.end);
            properties.push(Node::new(
                NodeKind::ObjectProperty {
                    key,
                    value: Box::new(value),
                },
                key_token.span.start,
                property_end,
            ));
        }
        Node::new(NodeKind::ObjectLiteral { properties }, open.span.start, end)
    }

    /// `(expr)` or `(left op right)`.
    fn parse_parenthesized(&mut self) -> Node {
        let Some(open) = self.advance() else {
            return self.invalid(self.eof_span());
        };

        let left = self.parse_expression();

        let op = self.peek().and_then(|it| {
            if it.kind != TokenKind::Operator {
                return None;
            }
            match self.text(it.span).as_str() {
                "+" => Some(BinaryOp::Add),
                "-" => Some(BinaryOp::Sub),
                "*" => Some(BinaryOp::Mul),
                "==" => Some(BinaryOp::Equal),
                "!=" => Some(BinaryOp::NotEqual),
                "<" => Some(BinaryOp::Less),
                ">" => Some(BinaryOp::Greater),
                _ => None,
            }
        });

        let inner = if let Some(op) = op {
            self.advance();
            let right = self.parse_expression();
            let (start, end) = (left.span.start, right.span.end);
            Node::new(
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                start,
                end,
            )
        } else {
            left
        };

        let end = if self.is_delimiter(self.peek(), ')') {
            self.advance().map_or(self.chars.len(), |it| it.span.end)
        } else {
            let span = self.peek().map_or(self.eof_span(), |it| it.span);
            self.report("expected `)`", span);
            inner.span.end
        };

        match inner.kind {
            NodeKind::Binary { .. } => Node {
                span: Span::new(open.span.start, end),
                kind: inner.kind,
            },
            _ => inner,
        }
    }
}

fn is_terminated_string(text: &str) -> bool {
    let mut chars = text.chars().skip(1);
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '"' => return true,
            _ => {}
        }
    }
    false
}

/// Strip the quotes and resolve `\"`, `\\`, `\n` and `\t`.
fn unescape(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut acc = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            acc.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => acc.push('\n'),
            Some('t') => acc.push('\t'),
            Some(other) => acc.push(other),
            None => {}
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(chunk: &ParsedChunk) -> &[Node] {
        match &chunk.root.kind {
            NodeKind::Module { statements } => statements,
            _ => panic!("root is not a module"),
        }
    }

    fn ident(name: &str, start: usize) -> Node {
        Node::new(
            NodeKind::Identifier { name: name.into() },
            start,
            start + name.chars().count(),
        )
    }

    #[test]
    fn test_command_call_extends_over_trailing_whitespace() {
        let chunk = parse("cmd help ");
        assert!(chunk.error.is_none());
        pretty_assertions::assert_eq!(
            statements(&chunk),
            &[Node::new(
                NodeKind::Call {
                    callee: Box::new(ident("cmd", 0)),
                    args: vec![ident("help", 4)],
                    is_parenthesized: false,
                },
                0,
                9,
            )]
        );
    }

    #[test]
    fn test_lone_identifier_is_not_a_call() {
        let chunk = parse("cmd");
        pretty_assertions::assert_eq!(statements(&chunk), &[ident("cmd", 0)]);

        let chunk = parse("cmd ");
        assert!(matches!(
            &statements(&chunk)[0].kind,
            NodeKind::Call { args, .. } if args.is_empty()
        ));
        assert_eq!(statements(&chunk)[0].span, Span::new(0, 4));
    }

    #[test]
    fn test_dangling_member_access() {
        let chunk = parse("obj.");
        assert!(chunk.error.is_none());
        pretty_assertions::assert_eq!(
            statements(&chunk),
            &[Node::new(
                NodeKind::Member {
                    base: Box::new(ident("obj", 0)),
                    properties: vec![Node::new(
                        NodeKind::Identifier {
                            name: String::new()
                        },
                        4,
                        4
                    )],
                },
                0,
                4,
            )]
        );
    }

    #[test]
    fn test_for_over_list_with_block() {
        let chunk = parse("for []{b}");
        assert!(chunk.error.is_none());
        pretty_assertions::assert_eq!(
            statements(&chunk),
            &[Node::new(
                NodeKind::ForStatement {
                    binding: None,
                    iterable: Box::new(Node::new(
                        NodeKind::ListLiteral { elements: vec![] },
                        4,
                        6
                    )),
                    body: Box::new(Node::new(
                        NodeKind::Block {
                            statements: vec![ident("b", 7)]
                        },
                        6,
                        9
                    )),
                },
                0,
                9,
            )]
        );
    }

    #[test]
    fn test_for_with_binding_and_walk() {
        let chunk = parse("for x in [1, 2] { print $x }\nwalk ./src, entry { prune }");
        assert!(chunk.error.is_none(), "{:?}", chunk.error);
        let statements = statements(&chunk);
        assert!(matches!(
            &statements[0].kind,
            NodeKind::ForStatement { binding: Some(name), .. } if name == "x"
        ));
        assert!(matches!(&statements[1].kind, NodeKind::WalkStatement { .. }));
    }

    #[test]
    fn test_assignments_if_and_binary() {
        let chunk = parse("$x = (1 + 2)\n$$g = {a: 1, \"b\": [true, nil]}\nif ($x > 2) { print yes } else { print no }");
        assert!(chunk.error.is_none(), "{:?}", chunk.error);
        let statements = statements(&chunk);
        assert_eq!(statements.len(), 3);
        assert!(matches!(
            &statements[0].kind,
            NodeKind::Assignment { value, .. }
                if matches!(value.kind, NodeKind::Binary { op: BinaryOp::Add, .. })
        ));
        assert_eq!(statements[0].span, Span::new(0, 12));
        assert!(matches!(&statements[2].kind, NodeKind::IfStatement { alternate: Some(_), .. }));
    }

    #[test]
    fn test_parenthesized_call() {
        let chunk = parse("len([1, 2])");
        assert!(chunk.error.is_none());
        assert!(matches!(
            &statements(&chunk)[0].kind,
            NodeKind::Call { is_parenthesized: true, args, .. } if args.len() == 1
        ));
    }

    #[test]
    fn test_errors_are_reported_but_tree_survives() {
        let chunk = parse("print \"abc");
        assert_eq!(
            chunk.error.as_ref().map(|it| it.message.as_str()),
            Some("unterminated string literal")
        );

        let chunk = parse("for [] { b");
        assert!(chunk.error.is_some());
        assert_eq!(chunk.root.span, Span::new(0, 10));

        let chunk = parse("}");
        assert!(chunk.error.is_some());
        assert!(matches!(&statements(&chunk)[0].kind, NodeKind::Invalid { .. }));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""a\"b\n""#), "a\"b\n");
        assert_eq!(unescape(r#""abc"#), "abc");
    }
}
