//! Backtracking grammar engine for cassia path expressions.
//!
//! The engine matches a fixed PEG-style grammar against a character buffer
//! and produces a flat, time-ordered list of rule-completion events. Every
//! named rule that succeeds emits exactly one [`ParseEvent`] spanning its
//! matched text at its call depth; children complete before their parent, so
//! the event list is a post-order trace of the parse tree. The semantic
//! action interpreter replays that list in emission order to build the AST.
//!
//! Matching is pure backtracking: each named rule snapshots
//! `(position, event-count, depth)` on entry and restores it when its body
//! fails, trying ordered alternatives first-match-wins. Repetition is greedy
//! and never re-tried with fewer elements. The buffer is terminated with a
//! distinguished end marker so end-of-input tests like any other character.

/// Named grammar rules. One parse event is emitted per successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Whole path expression: head plus segments
    Path,
    /// `$` document root head
    Root,
    /// `@` current-node head
    Current,
    /// Bare identifier head (filter-internal shorthand)
    BareHead,
    /// `.name` child member
    Member,
    /// `.*` wildcard member
    WildcardMember,
    /// `..x` recursive descent wrapper
    Recursive,
    /// `[ ... ]` bracket selector
    Bracket,
    /// Quoted identifier inside a bracket
    QuotedName,
    /// `(...)` script subscript
    Script,
    /// `?( ... )` filter subscript
    Filter,
    /// Signed integer subscript
    Index,
    /// Slice expression `start:end:step`
    Slice,
    /// Slice start bound
    SliceStart,
    /// Slice end bound
    SliceEnd,
    /// Slice step
    SliceStep,
    /// `[*]` wildcard subscript
    WildcardSub,
    /// `, subscript` union continuation
    UnionTail,
    /// Path expression used as a filter operand
    SubPath,
    /// Comparison or bare operand inside a filter query
    Comparison,
    /// `==`
    OpEq,
    /// `!=`
    OpNe,
    /// `>=`
    OpGe,
    /// `>`
    OpGt,
    /// `<=`
    OpLe,
    /// `<`
    OpLt,
    /// `/pattern/` regex literal after `=~`
    RegexLit,
    /// Numeric literal operand
    NumberLit,
    /// Quoted string literal operand
    StringLit,
    /// `true`
    TrueLit,
    /// `false`
    FalseLit,
    /// `null`
    NullLit,
    /// `! expr` logical negation
    NotExpr,
    /// `&& ...` conjunction continuation
    AndTail,
    /// `|| ...` disjunction continuation
    OrTail,
}

/// One rule-completion record over the character-position domain.
///
/// `begin..end` is the matched span, `depth` the nesting level of grammar
/// calls when the rule was entered. Among events, parent/child is span
/// containment and sibling order is traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseEvent {
    pub rule: Rule,
    pub begin: usize,
    pub end: usize,
    pub depth: usize,
}

/// Furthest-progressed failure, kept for the unrecognized-input diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFailure {
    pub rule: Rule,
    pub begin: usize,
    pub end: usize,
}

/// Successful parse: the input characters plus the ordered event trace.
#[derive(Debug, Clone)]
pub struct Trace {
    chars: Vec<char>,
    events: Vec<ParseEvent>,
}

impl Trace {
    /// Events in emission (replay) order.
    pub fn events(&self) -> &[ParseEvent] {
        &self.events
    }

    /// Text of an event span.
    pub fn text(&self, ev: &ParseEvent) -> String {
        self.chars[ev.begin..ev.end].iter().collect()
    }

    /// Text of an arbitrary span.
    pub fn span_text(&self, begin: usize, end: usize) -> String {
        self.chars[begin..end].iter().collect()
    }

    /// Reconstruct parent links purely from `(begin, end, depth)`.
    ///
    /// Walks the post-order trace with a bucket stack: an earlier event is a
    /// parent of a later-completing one iff its span contains the other's
    /// and its depth is smaller. Returns, per event index, the index of the
    /// enclosing event (None for the root). The replay order the interpreter
    /// relies on is exactly the stored order of this trace.
    pub fn parents(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.events.len()];
        // Post-order: a parent appears after all of its children. Scan
        // right-to-left keeping a stack of candidate ancestors.
        let mut stack: Vec<usize> = Vec::new();
        for i in (0..self.events.len()).rev() {
            let ev = &self.events[i];
            while let Some(&top) = stack.last() {
                let t = &self.events[top];
                if t.begin <= ev.begin && ev.end <= t.end && t.depth < ev.depth {
                    parents[i] = Some(top);
                    break;
                }
                stack.pop();
            }
            stack.push(i);
        }
        parents
    }
}

const END: char = '\0';

#[derive(Clone, Copy)]
struct Snapshot {
    pos: usize,
    event_count: usize,
    depth: usize,
}

/// The matcher: explicit parser state threaded through every rule function.
///
/// Position, event buffer, call depth and the furthest-failure tracker all
/// live here; snapshot/restore is a plain struct copy of the cursor fields.
pub struct Matcher {
    buf: Vec<char>,
    pos: usize,
    depth: usize,
    events: Vec<ParseEvent>,
    furthest: Option<MatchFailure>,
}

impl Matcher {
    pub fn new(input: &str) -> Self {
        let mut buf: Vec<char> = input.chars().collect();
        buf.push(END);
        Matcher {
            buf,
            pos: 0,
            depth: 0,
            events: Vec::new(),
            furthest: None,
        }
    }

    /// Match the whole buffer as a path expression.
    ///
    /// On success returns the ordered event trace; on failure the single
    /// furthest-reached failing rule span.
    pub fn parse(input: &str) -> Result<Trace, MatchFailure> {
        let mut m = Matcher::new(input);
        if m.path() && m.at_end() {
            let mut chars = m.buf;
            chars.pop(); // drop the end marker
            Ok(Trace {
                chars,
                events: m.events,
            })
        } else {
            Err(m.furthest.unwrap_or(MatchFailure {
                rule: Rule::Path,
                begin: m.pos,
                end: m.pos,
            }))
        }
    }

    // ------------------------------------------------------------------
    // Engine primitives
    // ------------------------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            event_count: self.events.len(),
            depth: self.depth,
        }
    }

    fn restore(&mut self, snap: Snapshot) {
        self.pos = snap.pos;
        self.events.truncate(snap.event_count);
        self.depth = snap.depth;
    }

    /// Run a named rule: snapshot, try the body one depth down, emit one
    /// event on success, restore and record the failure otherwise.
    fn named(&mut self, rule: Rule, body: fn(&mut Matcher) -> bool) -> bool {
        let snap = self.snapshot();
        self.depth += 1;
        let ok = body(self);
        self.depth -= 1;
        if ok {
            self.events.push(ParseEvent {
                rule,
                begin: snap.pos,
                end: self.pos,
                depth: snap.depth,
            });
            true
        } else {
            if self
                .furthest
                .is_none_or(|f| self.pos > f.end || (self.pos == f.end && snap.pos > f.begin))
            {
                self.furthest = Some(MatchFailure {
                    rule,
                    begin: snap.pos,
                    end: self.pos,
                });
            }
            self.restore(snap);
            false
        }
    }

    fn cur(&self) -> char {
        self.buf[self.pos]
    }

    fn at_end(&self) -> bool {
        self.cur() == END
    }

    fn ch(&mut self, c: char) -> bool {
        if self.cur() == c {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn lit(&mut self, s: &str) -> bool {
        let snap = self.pos;
        for c in s.chars() {
            if !self.ch(c) {
                self.pos = snap;
                return false;
            }
        }
        true
    }

    fn ws(&mut self) -> bool {
        while self.cur().is_whitespace() {
            self.pos += 1;
        }
        true
    }

    fn ident_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn ident(&mut self) -> bool {
        if !Self::ident_start(self.cur()) {
            return false;
        }
        while Self::ident_char(self.cur()) {
            self.pos += 1;
        }
        true
    }

    /// Zero-width assertion: the next character does not continue a word.
    /// Emits no event.
    fn word_boundary(&self) -> bool {
        !Self::ident_char(self.cur())
    }

    fn int(&mut self) -> bool {
        let snap = self.pos;
        if self.cur() == '-' || self.cur() == '+' {
            self.pos += 1;
        }
        if !self.cur().is_ascii_digit() {
            self.pos = snap;
            return false;
        }
        while self.cur().is_ascii_digit() {
            self.pos += 1;
        }
        true
    }

    /// Quoted span with backslash escaping; the content is un-escaped later
    /// by the action layer.
    fn qstring(&mut self, quote: char) -> bool {
        let snap = self.pos;
        if !self.ch(quote) {
            return false;
        }
        loop {
            let c = self.cur();
            if c == END {
                self.pos = snap;
                return false;
            }
            if c == quote {
                self.pos += 1;
                return true;
            }
            if c == '\\' {
                self.pos += 1;
                if self.cur() == END {
                    self.pos = snap;
                    return false;
                }
            }
            self.pos += 1;
        }
    }

    // ------------------------------------------------------------------
    // Path grammar
    // ------------------------------------------------------------------

    fn path(&mut self) -> bool {
        self.named(Rule::Path, |m| {
            if !m.head() {
                return false;
            }
            while m.segment() {}
            true
        })
    }

    fn head(&mut self) -> bool {
        self.named(Rule::Root, |m| m.ch('$'))
            || self.named(Rule::Current, |m| m.ch('@'))
            || self.named(Rule::BareHead, |m| m.ident())
    }

    fn segment(&mut self) -> bool {
        self.recursive() || self.dot_child() || self.bracket()
    }

    fn recursive(&mut self) -> bool {
        self.named(Rule::Recursive, |m| {
            m.lit("..") && (m.wildcard_member() || m.member() || m.bracket())
        })
    }

    fn dot_child(&mut self) -> bool {
        let snap = self.snapshot();
        if self.ch('.') && (self.wildcard_member() || self.member()) {
            true
        } else {
            self.restore(snap);
            false
        }
    }

    fn member(&mut self) -> bool {
        self.named(Rule::Member, |m| m.ident())
    }

    fn wildcard_member(&mut self) -> bool {
        self.named(Rule::WildcardMember, |m| m.ch('*'))
    }

    fn bracket(&mut self) -> bool {
        self.named(Rule::Bracket, |m| {
            m.ch('[') && m.ws() && m.bracket_body() && m.ws() && m.ch(']')
        })
    }

    fn bracket_body(&mut self) -> bool {
        self.filter()
            || self.script()
            || self.name_list()
            || self.named(Rule::WildcardSub, |m| m.ch('*'))
            || self.subscript_list()
    }

    fn filter(&mut self) -> bool {
        self.named(Rule::Filter, |m| {
            m.lit("?(") && m.ws() && m.query() && m.ws() && m.ch(')')
        })
    }

    fn script(&mut self) -> bool {
        self.named(Rule::Script, |m| {
            if !m.ch('(') {
                return false;
            }
            let mut nesting = 1usize;
            loop {
                let c = m.cur();
                if c == END {
                    return false;
                }
                if c == '(' {
                    nesting += 1;
                } else if c == ')' {
                    nesting -= 1;
                    if nesting == 0 {
                        m.pos += 1;
                        return true;
                    }
                }
                m.pos += 1;
            }
        })
    }

    fn name_list(&mut self) -> bool {
        if !self.quoted_name() {
            return false;
        }
        loop {
            let snap = self.snapshot();
            self.ws();
            if !(self.ch(',') && self.ws() && self.quoted_name()) {
                self.restore(snap);
                break;
            }
        }
        true
    }

    fn quoted_name(&mut self) -> bool {
        self.named(Rule::QuotedName, |m| m.qstring('\'') || m.qstring('"'))
    }

    fn subscript_list(&mut self) -> bool {
        if !self.subscript() {
            return false;
        }
        loop {
            let matched = self.named(Rule::UnionTail, |m| {
                m.ws() && m.ch(',') && m.ws() && m.subscript()
            });
            if !matched {
                break;
            }
        }
        true
    }

    fn subscript(&mut self) -> bool {
        self.slice() || self.named(Rule::Index, |m| m.int())
    }

    fn slice(&mut self) -> bool {
        self.named(Rule::Slice, |m| {
            m.named(Rule::SliceStart, |m| m.int());
            m.ws();
            if !m.ch(':') {
                return false;
            }
            m.ws();
            m.named(Rule::SliceEnd, |m| m.int());
            m.ws();
            let snap = m.snapshot();
            if m.ch(':') {
                m.ws();
                if !m.named(Rule::SliceStep, |m| m.int()) {
                    m.restore(snap);
                }
            }
            true
        })
    }

    // ------------------------------------------------------------------
    // Filter query grammar
    // ------------------------------------------------------------------

    fn query(&mut self) -> bool {
        if !self.and_expr() {
            return false;
        }
        self.named(Rule::OrTail, |m| {
            m.ws() && m.lit("||") && m.ws() && m.query()
        });
        true
    }

    fn and_expr(&mut self) -> bool {
        if !self.unary() {
            return false;
        }
        self.named(Rule::AndTail, |m| {
            m.ws() && m.lit("&&") && m.ws() && m.and_expr()
        });
        true
    }

    fn unary(&mut self) -> bool {
        self.named(Rule::NotExpr, |m| m.ch('!') && m.ws() && m.unary()) || self.primary()
    }

    fn primary(&mut self) -> bool {
        self.group() || self.comparison()
    }

    fn group(&mut self) -> bool {
        let snap = self.snapshot();
        if self.ch('(') && self.ws() && self.query() && self.ws() && self.ch(')') {
            true
        } else {
            self.restore(snap);
            false
        }
    }

    fn comparison(&mut self) -> bool {
        self.named(Rule::Comparison, |m| {
            if !m.operand() {
                return false;
            }
            let snap = m.snapshot();
            m.ws();
            if m.cmp_op() {
                m.ws();
                if m.operand() {
                    return true;
                }
                m.restore(snap);
                return true;
            }
            if m.lit("=~") {
                m.ws();
                if m.named(Rule::RegexLit, |m| m.regex_body()) {
                    return true;
                }
            }
            m.restore(snap);
            true
        })
    }

    fn cmp_op(&mut self) -> bool {
        self.named(Rule::OpEq, |m| m.lit("=="))
            || self.named(Rule::OpNe, |m| m.lit("!="))
            || self.named(Rule::OpLe, |m| m.lit("<="))
            || self.named(Rule::OpLt, |m| m.ch('<'))
            || self.named(Rule::OpGe, |m| m.lit(">="))
            || self.named(Rule::OpGt, |m| m.ch('>'))
    }

    fn regex_body(&mut self) -> bool {
        let snap = self.pos;
        if !self.ch('/') {
            return false;
        }
        loop {
            let c = self.cur();
            if c == END {
                self.pos = snap;
                return false;
            }
            if c == '/' {
                self.pos += 1;
                return true;
            }
            if c == '\\' {
                self.pos += 1;
                if self.cur() == END {
                    self.pos = snap;
                    return false;
                }
            }
            self.pos += 1;
        }
    }

    fn operand(&mut self) -> bool {
        self.literal() || self.sub_path()
    }

    fn literal(&mut self) -> bool {
        self.named(Rule::StringLit, |m| m.qstring('\'') || m.qstring('"'))
            || self.named(Rule::TrueLit, |m| m.lit("true") && m.word_boundary())
            || self.named(Rule::FalseLit, |m| m.lit("false") && m.word_boundary())
            || self.named(Rule::NullLit, |m| m.lit("null") && m.word_boundary())
            || self.named(Rule::NumberLit, |m| m.number_text())
    }

    /// Numeric literal text: optional sign, a digit, then a permissive tail
    /// of digits, letters, dots and signs. Conversion happens in the action
    /// layer and fails closed on malformed text.
    fn number_text(&mut self) -> bool {
        let snap = self.pos;
        if self.cur() == '-' || self.cur() == '+' {
            self.pos += 1;
        }
        if !self.cur().is_ascii_digit() {
            self.pos = snap;
            return false;
        }
        loop {
            let c = self.cur();
            if c.is_ascii_alphanumeric() || c == '.' || c == '+' || c == '-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        true
    }

    fn sub_path(&mut self) -> bool {
        self.named(Rule::SubPath, |m| {
            if !m.head() {
                return false;
            }
            while m.segment() {}
            true
        })
    }
}

#[test]
fn test_root_alone() {
    let trace = Matcher::parse("$").unwrap();
    let rules: Vec<Rule> = trace.events().iter().map(|e| e.rule).collect();
    assert_eq!(rules, vec![Rule::Root, Rule::Path]);
    assert_eq!(trace.events()[0].depth, 1);
    assert_eq!(trace.events()[1].depth, 0);
}

#[test]
fn test_members_complete_before_path() {
    let trace = Matcher::parse("$.a.b").unwrap();
    let rules: Vec<Rule> = trace.events().iter().map(|e| e.rule).collect();
    assert_eq!(rules, vec![Rule::Root, Rule::Member, Rule::Member, Rule::Path]);
    // per-depth end positions are non-decreasing
    let members: Vec<_> = trace
        .events()
        .iter()
        .filter(|e| e.rule == Rule::Member)
        .collect();
    assert!(members[0].end <= members[1].end);
}

#[test]
fn test_slice_emits_bounds() {
    let trace = Matcher::parse("$[1:3]").unwrap();
    let rules: Vec<Rule> = trace.events().iter().map(|e| e.rule).collect();
    assert!(rules.contains(&Rule::SliceStart));
    assert!(rules.contains(&Rule::SliceEnd));
    assert!(rules.contains(&Rule::Slice));
    assert!(!rules.contains(&Rule::SliceStep));
}

#[test]
fn test_backtracking_restores_events() {
    // `[1]` first tries the slice alternative, fails at ':', and must
    // leave no stray SliceStart event behind.
    let trace = Matcher::parse("$[1]").unwrap();
    let rules: Vec<Rule> = trace.events().iter().map(|e| e.rule).collect();
    assert!(!rules.contains(&Rule::SliceStart));
    assert!(rules.contains(&Rule::Index));
}

#[test]
fn test_failure_reports_furthest_span() {
    let err = Matcher::parse("$.a[").unwrap_err();
    assert!(err.end >= 4);
}

#[test]
fn test_parents_reconstruct_from_spans() {
    let trace = Matcher::parse("$.a").unwrap();
    let parents = trace.parents();
    let path_idx = trace
        .events()
        .iter()
        .position(|e| e.rule == Rule::Path)
        .unwrap();
    let member_idx = trace
        .events()
        .iter()
        .position(|e| e.rule == Rule::Member)
        .unwrap();
    assert_eq!(parents[member_idx], Some(path_idx));
    assert_eq!(parents[path_idx], None);
}
