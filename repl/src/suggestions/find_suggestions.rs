// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Context aware completion. The node at the cursor picks the strategy; every strategy
//! filters its candidates by what has been typed so far.

use std::collections::HashSet;

use crate::{FilesystemProvider, Keyword, Node, NodeAtCursor, NodeKind, ParsedChunk,
            ScopeProvider, Span, Suggestion, Value, dir_to_list, find_node_at_cursor};

const SCHEME_SEPARATOR: &str = "://";
const LOCALHOST: &str = "localhost";

/// Completion candidates for `cursor` in `chunk`. Every returned suggestion has its span
/// set, and duplicates are removed. The order is the order candidates were found in;
/// callers sort the shown strings for display.
#[must_use]
pub fn find_suggestions(
    scope: &dyn ScopeProvider,
    filesystem: &dyn FilesystemProvider,
    chunk: &ParsedChunk,
    cursor: usize,
) -> Vec<Suggestion> {
    let Some(at_cursor) = find_node_at_cursor(&chunk.root, cursor) else {
        return vec![];
    };
    let context = Context {
        scope,
        filesystem,
        source: chunk.source.chars().collect(),
        cursor,
    };
    let node_span = at_cursor.node.span;

    let candidates = match &at_cursor.node.kind {
        NodeKind::PatternName { name } => context.pattern_names(name),
        NodeKind::LocalVariable { name } => context.variables(&scope.local_names(), name, "$"),
        NodeKind::GlobalVariable { name } => {
            context.variables(&scope.global_names(), name, "$$")
        }
        NodeKind::Identifier { name } => context.identifier(name, &at_cursor),
        NodeKind::Member { base, properties } => context.member(base, properties, node_span),
        NodeKind::Call {
            callee,
            args,
            is_parenthesized: false,
        } => context.subcommands_at_cursor(callee, args),
        NodeKind::PathLiteral { raw } => context.paths(raw),
        NodeKind::HostLiteral { raw } | NodeKind::SchemeLiteral { raw } => context.hosts(raw),
        NodeKind::UrlLiteral { raw } => context.urls(raw),
        NodeKind::Call {
            is_parenthesized: true,
            ..
        }
        | NodeKind::Module { .. }
        | NodeKind::Block { .. }
        | NodeKind::Initializer { .. }
        | NodeKind::ForStatement { .. }
        | NodeKind::WalkStatement { .. }
        | NodeKind::IfStatement { .. }
        | NodeKind::Assignment { .. }
        | NodeKind::BreakStatement
        | NodeKind::ContinueStatement
        | NodeKind::PruneStatement
        | NodeKind::ReturnStatement { .. }
        | NodeKind::ListLiteral { .. }
        | NodeKind::ObjectLiteral { .. }
        | NodeKind::ObjectProperty { .. }
        | NodeKind::StringLiteral { .. }
        | NodeKind::IntLiteral { .. }
        | NodeKind::BoolLiteral { .. }
        | NodeKind::NilLiteral
        | NodeKind::Binary { .. }
        | NodeKind::Invalid { .. } => vec![],
    };

    let mut seen = HashSet::new();
    let acc: Vec<Suggestion> = candidates
        .into_iter()
        .map(|it| {
            let span = it.span.unwrap_or(node_span);
            it.with_span(span)
        })
        .filter(|it| seen.insert(it.clone()))
        .collect();

    tracing::trace!(message = "suggestions", cursor, count = acc.len());
    acc
}

/// How an identifier relates to the call it sits in, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallRole<'a> {
    None,
    Callee { has_args: bool },
    Arg { callee: &'a Node, preceding: &'a [Node] },
}

struct Context<'a> {
    scope: &'a dyn ScopeProvider,
    filesystem: &'a dyn FilesystemProvider,
    source: Vec<char>,
    cursor: usize,
}

fn matching<'s>(
    names: impl IntoIterator<Item = &'s str>,
    prefix: &'s str,
) -> impl Iterator<Item = &'s str> {
    names.into_iter().filter(move |it| it.starts_with(prefix))
}

fn is_statement_container(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Module { .. } | NodeKind::Block { .. } | NodeKind::Initializer { .. }
    )
}

/// Identifier names of `nodes`, or `None` if any of them isn't a plain identifier.
fn identifier_chain(nodes: &[Node]) -> Option<Vec<&str>> {
    nodes.iter().map(Node::identifier_name).collect()
}

impl Context<'_> {
    fn text(&self, span: Span) -> String {
        let span = span.clamp_to(self.source.len());
        self.source[span.start..span.end].iter().collect()
    }

    fn pattern_names(&self, typed: &str) -> Vec<Suggestion> {
        let patterns = self.scope.named_patterns();
        let namespaces = self.scope.pattern_namespaces();
        let mut acc: Vec<Suggestion> = matching(patterns.iter().map(String::as_str), typed)
            .map(|it| Suggestion::same(format!("%{it}")))
            .collect();
        acc.extend(
            matching(namespaces.iter().map(String::as_str), typed)
                .map(|it| Suggestion::same(format!("%{it}."))),
        );
        acc
    }

    fn variables(&self, names: &[String], typed: &str, sigil: &str) -> Vec<Suggestion> {
        matching(names.iter().map(String::as_str), typed)
            .map(|it| Suggestion::same(format!("{sigil}{it}")))
            .collect()
    }

    fn identifier(&self, typed: &str, at_cursor: &NodeAtCursor<'_>) -> Vec<Suggestion> {
        let node = at_cursor.node;
        let parent = at_cursor.parent();

        let role = match parent.map(|it| &it.kind) {
            Some(NodeKind::Call { callee, args, .. }) => {
                if std::ptr::eq(callee.as_ref(), node) {
                    CallRole::Callee {
                        has_args: !args.is_empty(),
                    }
                } else {
                    let index = args
                        .iter()
                        .position(|it| std::ptr::eq(it, node))
                        .unwrap_or(args.len());
                    CallRole::Arg {
                        callee,
                        preceding: &args[..index],
                    }
                }
            }
            _ => CallRole::None,
        };

        // The statement an identifier starts. `cmd ` is a call with no arguments, the
        // identifier still sits at statement level.
        let statement_parent = match role {
            CallRole::Callee { has_args: false } => at_cursor.grandparent(),
            CallRole::None => parent,
            CallRole::Callee { .. } | CallRole::Arg { .. } => None,
        };
        let is_statement_start = statement_parent.is_some_and(is_statement_container);

        let mut acc = vec![];

        // Command names and subcommands from granted permissions.
        match role {
            CallRole::Arg { callee, preceding } => {
                if let Some(command) = callee.identifier_name()
                    && let Some(typed_chain) = identifier_chain(preceding)
                {
                    acc.extend(self.subcommands(command, &typed_chain, typed));
                }
            }
            CallRole::Callee { .. } => acc.extend(self.command_names(typed)),
            CallRole::None if is_statement_start => acc.extend(self.command_names(typed)),
            CallRole::None => {}
        }

        // Variables.
        let locals = self.scope.local_names();
        let globals = self.scope.global_names();
        acc.extend(
            matching(
                locals.iter().chain(globals.iter()).map(String::as_str),
                typed,
            )
            .map(Suggestion::same),
        );

        // Keywords.
        if is_statement_start {
            acc.extend(keywords(&Keyword::STATEMENT, typed));
            if let Some(block) = statement_parent {
                match owner_of_block(at_cursor, block).map(|it| &it.kind) {
                    Some(NodeKind::ForStatement { body, .. })
                        if std::ptr::eq(body.as_ref(), block) =>
                    {
                        acc.extend(keywords(&Keyword::LOOP, typed));
                    }
                    Some(NodeKind::WalkStatement { body, .. })
                        if std::ptr::eq(body.as_ref(), block) =>
                    {
                        acc.extend(keywords(&Keyword::WALK, typed));
                    }
                    _ => {}
                }
            }
        }
        acc.extend(keywords(&Keyword::EXPRESSION, typed));

        acc
    }

    /// Completions for a cursor after the last argument of a command form call:
    /// the next subcommand, inserted at the cursor.
    fn subcommands_at_cursor(&self, callee: &Node, args: &[Node]) -> Vec<Suggestion> {
        let Some(command) = callee.identifier_name() else {
            return vec![];
        };
        let Some(typed_chain) = identifier_chain(args) else {
            return vec![];
        };
        let insertion = Span::new(self.cursor, self.cursor + 1);
        self.subcommands(command, &typed_chain, "")
            .into_iter()
            .map(|it| it.with_span(insertion))
            .collect()
    }

    fn command_names(&self, typed: &str) -> Vec<Suggestion> {
        self.scope
            .command_permissions()
            .into_iter()
            .filter(|it| it.command_name.starts_with(typed))
            .map(|it| Suggestion::same(it.command_name))
            .collect()
    }

    /// The subcommand at position `typed_chain.len()` of every grant for `command` whose
    /// chain starts with `typed_chain`.
    fn subcommands(&self, command: &str, typed_chain: &[&str], typed: &str) -> Vec<Suggestion> {
        let position = typed_chain.len();
        self.scope
            .command_permissions()
            .into_iter()
            .filter(|it| it.command_name == command)
            .filter(|it| {
                it.subcommand_chain.len() > position
                    && it.subcommand_chain[..position]
                        .iter()
                        .zip(typed_chain)
                        .all(|(granted, typed)| granted == typed)
            })
            .map(|it| it.subcommand_chain[position].clone())
            .filter(|it| it.starts_with(typed))
            .map(Suggestion::same)
            .collect()
    }

    fn member(&self, base: &Node, properties: &[Node], span: Span) -> Vec<Suggestion> {
        let mut value: Option<Value> = match &base.kind {
            NodeKind::Identifier { name }
            | NodeKind::LocalVariable { name }
            | NodeKind::GlobalVariable { name } => self.scope.resolve(name),
            _ => None,
        };

        let Some((last, walked)) = properties.split_last() else {
            return vec![];
        };
        let mut path = self.text(base.span);
        for property in walked {
            let name = property.identifier_name().unwrap_or_default();
            value = value.and_then(|it| it.property(name).cloned());
            path.push('.');
            path.push_str(name);
        }
        let Some(value) = value else {
            return vec![];
        };

        let typed = last.identifier_name().unwrap_or_default();
        matching(value.property_names(), typed)
            .map(|it| Suggestion::same(format!("{path}.{it}")).with_span(span))
            .collect()
    }

    fn paths(&self, raw: &str) -> Vec<Suggestion> {
        let (dir, prefix) = match raw.rfind('/') {
            Some(index) => raw.split_at(index + 1),
            None => ("", raw),
        };
        let entries = match self.filesystem.read_dir(&dir_to_list(dir)) {
            Ok(it) => it,
            Err(error) => {
                tracing::debug!(message = "path completion failed", dir, ?error);
                return vec![];
            }
        };
        let show_hidden = prefix.starts_with('.');
        entries
            .into_iter()
            .filter(|it| it.name.starts_with(prefix))
            .filter(|it| show_hidden || !it.name.starts_with('.'))
            .map(|it| {
                let name = if it.is_dir {
                    format!("{}/", it.name)
                } else {
                    it.name
                };
                Suggestion::new(name.clone(), format!("{dir}{name}"))
            })
            .collect()
    }

    fn hosts(&self, raw: &str) -> Vec<Suggestion> {
        let Some((scheme, authority)) = raw.split_once(SCHEME_SEPARATOR) else {
            return vec![];
        };
        let mut acc: Vec<Suggestion> = self
            .scope
            .host_definitions()
            .into_iter()
            .filter(|it| it.starts_with(authority))
            .map(|it| Suggestion::same(format!("{scheme}{SCHEME_SEPARATOR}{it}")))
            .collect();
        if LOCALHOST.starts_with(authority) {
            acc.push(Suggestion::same(format!(
                "{scheme}{SCHEME_SEPARATOR}{LOCALHOST}"
            )));
        }
        acc
    }

    fn urls(&self, raw: &str) -> Vec<Suggestion> {
        self.scope
            .url_entries()
            .into_iter()
            .filter(|it| it.starts_with(raw))
            .map(Suggestion::same)
            .collect()
    }
}

fn keywords(set: &[Keyword], typed: &str) -> Vec<Suggestion> {
    set.iter()
        .map(AsRef::<str>::as_ref)
        .filter(|it| it.starts_with(typed))
        .map(Suggestion::same)
        .collect()
}

/// The node that owns `block`, i.e. its parent. `None` if `block` is itself a scope
/// boundary.
fn owner_of_block<'a>(at_cursor: &NodeAtCursor<'a>, block: &'a Node) -> Option<&'a Node> {
    if block.is_scope_boundary() {
        return None;
    }
    let block_index = at_cursor
        .ancestors
        .iter()
        .rposition(|it| std::ptr::eq(*it, block))?;
    at_cursor.ancestors.get(block_index.checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serial_test::serial;

    use super::*;
    use crate::{CommandPermission, EvalState, OsFilesystem, OutputDevice, parse};

    fn state() -> EvalState {
        let (output_device, _) = OutputDevice::new_mock();
        EvalState::new(output_device)
    }

    fn suggest(state: &EvalState, source: &str, cursor: usize) -> Vec<Suggestion> {
        find_suggestions(state, state.filesystem.as_ref(), &parse(source), cursor)
    }

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        let mut acc: Vec<&str> = suggestions.iter().map(|it| it.value.as_str()).collect();
        acc.sort_unstable();
        acc
    }

    #[test]
    fn test_member_completion() {
        let mut state = state();
        state.set_local("obj", Value::object([("name", Value::Str("n".into()))]));

        pretty_assertions::assert_eq!(suggest(&state, "obj.", 4), vec![Suggestion {
            shown: "obj.name".into(),
            value: "obj.name".into(),
            span: Some(Span::new(0, 4)),
        }]);
    }

    #[test]
    fn test_member_completion_walks_the_chain() {
        let mut state = state();
        state.set_local(
            "cfg",
            Value::object([(
                "server",
                Value::object([("host", Value::Nil), ("port", Value::Int(1))]),
            )]),
        );
        assert_eq!(values(&suggest(&state, "cfg.server.p", 12)), vec!["cfg.server.port"]);
        assert_eq!(values(&suggest(&state, "cfg.server.", 11)), vec![
            "cfg.server.host",
            "cfg.server.port"
        ]);
        assert!(suggest(&state, "cfg.nope.", 9).is_empty());
        assert!(suggest(&state, "unbound.", 8).is_empty());
    }

    #[test]
    fn test_subcommand_completion() {
        let state = state().with_permissions(vec![
            CommandPermission::try_parse("cmd help run").unwrap(),
            CommandPermission::try_parse("cmd help build").unwrap(),
            CommandPermission::try_parse("cmd version").unwrap(),
        ]);

        let mut suggestions = suggest(&state, "cmd help ", 9);
        suggestions.sort_by(|a, b| a.shown.cmp(&b.shown));
        pretty_assertions::assert_eq!(suggestions, vec![
            Suggestion::same("build").with_span(Span::new(9, 10)),
            Suggestion::same("run").with_span(Span::new(9, 10)),
        ]);

        // Typing into an argument completes that position.
        assert_eq!(values(&suggest(&state, "cmd help b", 10)), vec!["build"]);
        assert_eq!(values(&suggest(&state, "cmd v", 5)), vec!["version"]);
        assert_eq!(values(&suggest(&state, "cmd ", 4)), vec!["help", "version"]);
        // Diverging chain.
        assert!(suggest(&state, "cmd nope ", 9).is_empty());
        // Command names at statement level.
        assert!(values(&suggest(&state, "cm", 2)).contains(&"cmd"));
    }

    #[test]
    fn test_subcommand_completion_inside_an_auto_closed_block() {
        let state = state().with_permissions(vec![
            CommandPermission::try_parse("cmd help build").unwrap(),
        ]);
        let source = "for [] {cmd help }";

        let suggestions = suggest(&state, source, 17);
        pretty_assertions::assert_eq!(suggestions, vec![
            Suggestion::same("build").with_span(Span::new(17, 18))
        ]);

        let mut buffer = crate::LineBuffer::new();
        buffer.set_text(source);
        buffer.set_cursor_offset(17);
        crate::apply_suggestions(&mut buffer, &suggestions);
        assert_eq!(buffer.text(), "for [] {cmd help build}");
    }

    #[test]
    fn test_path_completion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file1.txt"), "").unwrap();
        std::fs::write(dir.path().join("file2.txt"), "").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();
        std::fs::create_dir(dir.path().join("folder")).unwrap();
        let dir_text = dir.path().to_string_lossy().into_owned();
        let state = state().with_filesystem(Arc::new(OsFilesystem));

        let source = format!("{dir_text}/fi");
        let suggestions = suggest(&state, &source, source.chars().count());
        let whole_path = Span::new(0, source.chars().count());
        assert_eq!(values(&suggestions), vec![
            format!("{dir_text}/file1.txt"),
            format!("{dir_text}/file2.txt"),
        ]);
        assert!(suggestions.iter().all(|it| it.span == Some(whole_path)));

        let source = format!("{dir_text}/");
        let suggestions = suggest(&state, &source, source.chars().count());
        assert_eq!(suggestions.len(), 3);
        assert!(values(&suggestions).contains(&format!("{dir_text}/folder/").as_str()));

        let source = format!("{dir_text}/.");
        assert_eq!(suggest(&state, &source, source.chars().count()).len(), 1);
    }

    #[test]
    #[serial]
    fn test_relative_path_completion_reads_the_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let state = state().with_filesystem(Arc::new(OsFilesystem));

        let saved_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let suggestions = suggest(&state, "./n", 3);
        std::env::set_current_dir(saved_dir).unwrap();

        assert_eq!(values(&suggestions), vec!["./nested/", "./notes.txt"]);
        assert!(suggestions.iter().all(|it| it.span == Some(Span::new(0, 3))));
    }

    #[test]
    fn test_keyword_scoping() {
        let state = state();

        let suggestions = suggest(&state, "for []{b}", 8);
        assert_eq!(suggestions, vec![
            Suggestion::same("break").with_span(Span::new(7, 8))
        ]);

        // Same `b`, no loop.
        assert!(suggest(&state, "b", 1).is_empty());

        // `prune` only in a walk body, `continue` only in a loop body.
        assert_eq!(values(&suggest(&state, "walk ./x, e {p}", 14)), vec!["prune"]);
        assert!(suggest(&state, "for [] {p}", 9).is_empty());
        assert_eq!(values(&suggest(&state, "for [] {c}", 9)), vec!["continue"]);

        // An initializer is a scope boundary.
        assert!(suggest(&state, "for [] { init {b} }", 16).is_empty());
    }

    #[test]
    fn test_statement_and_expression_keywords() {
        let state = state();
        assert_eq!(values(&suggest(&state, "f", 1)), vec!["false", "for"]);
        // Argument position: expression keywords only.
        assert_eq!(values(&suggest(&state, "print f", 7)), vec!["false"]);
        // A zero argument call is still at statement level.
        assert_eq!(values(&suggest(&state, "w ", 1)), vec!["walk"]);
    }

    #[test]
    fn test_variables_and_patterns() {
        let mut state = state();
        state.set_local("count", Value::Int(1));
        state.set_global("config", Value::Nil);
        state.pattern_namespaces.insert("net".into());

        assert_eq!(values(&suggest(&state, "$co", 3)), vec!["$count"]);
        assert_eq!(values(&suggest(&state, "$$co", 4)), vec!["$$config"]);
        assert_eq!(values(&suggest(&state, "print co", 8)), vec!["config", "count"]);
        assert_eq!(values(&suggest(&state, "%n", 2)), vec!["%net."]);
        assert_eq!(values(&suggest(&state, "%", 1)), vec![
            "%bool", "%int", "%net.", "%path", "%str", "%url"
        ]);
    }

    #[test]
    fn test_hosts_and_urls() {
        let mut state = state();
        state.host_definitions.push("example.com".into());
        state.url_entries.push("https://example.com/api/users".into());

        assert_eq!(values(&suggest(&state, "https://", 8)), vec![
            "https://example.com",
            "https://localhost"
        ]);
        assert_eq!(values(&suggest(&state, "https://lo", 10)), vec!["https://localhost"]);
        assert_eq!(values(&suggest(&state, "https://example.com/a", 21)), vec![
            "https://example.com/api/users"
        ]);
    }

    #[test]
    fn test_idempotent() {
        let mut state = state().with_permissions(vec![
            CommandPermission::try_parse("cmd help build").unwrap(),
        ]);
        state.set_local("obj", Value::object([("a", Value::Nil), ("b", Value::Nil)]));

        for (source, cursor) in [("cmd help ", 9), ("obj.", 4), ("f", 1), ("", 0)] {
            let first = suggest(&state, source, cursor);
            let second = suggest(&state, source, cursor);
            assert_eq!(first, second, "{source}");
        }
    }
}
