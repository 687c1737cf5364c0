//! S-expression rendering of AST trees, for diagnostics and diffing.

use super::ast::{AssignOp, Ast, BuiltinType, Constant, LoopCheck, Node, NodeId};

const WRAP_WIDTH: usize = 72;

/// Render a list of root nodes as a parenthesized tree. Pure function of
/// tree shape; cannot fail.
pub fn print_ast(ast: &Ast, roots: &[NodeId]) -> String {
    let mut printer = AstPrinter { ast, out: SexprWriter::new() };
    printer.print_list(roots, true, false);
    printer.out.buf
}

/// Line-wrapping s-expression writer. Tracks the output column and paren
/// nesting; when a token would run past the wrap width it breaks the line,
/// carrying any trailing "hanging" open-parens (opened but not yet labelled)
/// onto the new line so openers stay attached to their content.
struct SexprWriter {
    buf: String,
    nest_depth: usize,
    column: usize,
    consec_opens: usize,
    need_space: bool,
}

impl SexprWriter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            nest_depth: 0,
            column: 0,
            consec_opens: 0,
            need_space: false,
        }
    }

    fn open(&mut self, label: Option<&str>) {
        let labellen = label.map_or(0, str::len);
        self.check_wrap(labellen + 1 + self.need_space as usize);
        if self.need_space {
            self.buf.push(' ');
            self.consec_opens = 0;
        }
        self.buf.push('(');
        self.consec_opens += 1;
        if let Some(label) = label {
            self.buf.push_str(label);
        }
        self.column += labellen + 1 + self.need_space as usize;
        self.nest_depth += 1;
        self.need_space = label.is_some();
    }

    fn close(&mut self) {
        debug_assert!(self.nest_depth != 0);
        self.buf.push(')');
        self.column += 1;
        self.nest_depth -= 1;
        self.need_space = true;
    }

    fn brk(&mut self) {
        // Don't break if not needed.
        if self.column != self.nest_depth {
            if self.need_space {
                self.consec_opens = 0;
            } else {
                // Move hanging ( characters to the new line
                self.buf.truncate(self.buf.len() - self.consec_opens);
                self.nest_depth -= self.consec_opens;
            }
            self.buf.push('\n');
            self.column = self.nest_depth;
            self.need_space = false;
            for _ in 0..self.nest_depth {
                self.buf.push(' ');
            }
            if self.consec_opens > 0 {
                for _ in 0..self.consec_opens {
                    self.buf.push('(');
                }
                self.nest_depth += self.consec_opens;
                self.column += self.consec_opens;
            }
        }
    }

    fn check_wrap(&mut self, len: usize) -> bool {
        if len + self.column > WRAP_WIDTH {
            self.brk();
            true
        } else {
            false
        }
    }

    fn add(&mut self, s: &str) {
        self.check_wrap(s.len() + self.need_space as usize);
        if self.need_space {
            self.buf.push(' ');
        }
        self.buf.push_str(s);
        self.column += s.len() + self.need_space as usize;
        self.need_space = true;
    }

    fn add_name(&mut self, name: &str) {
        self.check_wrap(name.len() + 2 + self.need_space as usize);
        if self.need_space {
            self.buf.push(' ');
        }
        self.buf.push('\'');
        self.buf.push_str(name);
        self.buf.push('\'');
        self.column += name.len() + 2 + self.need_space as usize;
        self.need_space = true;
    }

    fn add_int(&mut self, i: i64) {
        self.add(&i.to_string());
    }

    fn add_uint(&mut self, u: u32) {
        self.add(&format!("{u}u"));
    }

    fn add_hex(&mut self, x: u32) {
        self.add(&format!("{x:08x}"));
    }

    fn add_float(&mut self, f: f64, single: bool) {
        let mut s = format!("{f:.4}");
        if single {
            s.push('f');
        }
        self.add(&s);
    }

    fn add_string_literal(&mut self, s: &str) {
        let mut quoted = String::with_capacity(s.len() + 2);
        quoted.push('"');
        for c in s.chars() {
            if c == '"' {
                quoted.push_str("\\\"");
            } else if c == '\\' {
                quoted.push_str("\\\\");
            } else if c >= ' ' {
                quoted.push(c);
            } else {
                quoted.push_str(&format!("\\x{:02X}", c as u32));
            }
        }
        quoted.push('"');
        self.add(&quoted);
    }
}

struct AstPrinter<'a> {
    ast: &'a Ast,
    out: SexprWriter,
}

impl AstPrinter<'_> {
    /// A child list. An empty list prints literally as `nil`; each element
    /// is visited exactly once.
    fn print_list(&mut self, nodes: &[NodeId], newlist: bool, addbreaks: bool) {
        if nodes.is_empty() {
            self.out.add("nil");
            return;
        }
        if newlist {
            self.out.open(None);
        }
        for &id in nodes {
            if addbreaks {
                self.out.brk();
            }
            self.print_node(id);
        }
        if newlist {
            self.out.close();
        }
    }

    /// A single optional child. `None` prints literally as `nil`.
    fn print_link(&mut self, node: Option<NodeId>, newlist: bool) {
        match node {
            None => self.out.add("nil"),
            Some(id) => {
                if newlist {
                    self.out.open(None);
                }
                self.print_node(id);
                if newlist {
                    self.out.close();
                }
            }
        }
    }

    fn print_node(&mut self, id: NodeId) {
        match self.ast.get(id) {
            Node::Identifier { name } => {
                self.out.open(Some("identifier"));
                self.out.add_name(name);
                self.out.close();
            }
            Node::Class { name, parent, replaces, flags, body } => {
                self.out.brk();
                self.out.open(Some("class"));
                self.out.add_name(name);
                self.print_list(parent, true, false);
                self.print_list(replaces, true, false);
                self.out.add_hex(*flags);
                self.print_list(body, false, true);
                self.out.close();
            }
            Node::Struct { name, body } => {
                self.out.brk();
                self.out.open(Some("struct"));
                self.out.add_name(name);
                self.print_list(body, false, true);
                self.out.close();
            }
            Node::Enum { name, ty, elements } => {
                self.out.brk();
                self.out.open(Some("enum"));
                self.out.add_name(name);
                self.out.add(ty.name());
                self.out.add(if elements.is_empty() { "nil" } else { "..." });
                self.out.close();
            }
            Node::EnumTerminator => {
                self.out.open(Some("enum-term"));
                self.out.close();
            }
            Node::States { body } => {
                self.out.brk();
                self.out.open(Some("states"));
                self.print_list(body, false, true);
                self.out.close();
            }
            Node::StatePart => {
                self.out.open(Some("state-part"));
                self.out.close();
            }
            Node::StateLabel { label } => {
                self.out.open(Some("state-label"));
                self.out.add_name(label);
                self.out.close();
            }
            Node::StateStop => {
                self.out.open(Some("state-stop"));
                self.out.close();
            }
            Node::StateWait => {
                self.out.open(Some("state-wait"));
                self.out.close();
            }
            Node::StateFail => {
                self.out.open(Some("state-fail"));
                self.out.close();
            }
            Node::StateLoop => {
                self.out.open(Some("state-loop"));
                self.out.close();
            }
            Node::StateGoto { label, offset } => {
                self.out.open(Some("state-goto"));
                self.print_list(label, true, false);
                self.print_link(*offset, true);
                self.out.close();
            }
            Node::StateLine { sprite, frames, bright, duration, offset, action } => {
                self.out.open(Some("state-line"));
                self.out.add(sprite);
                if *bright {
                    self.out.add("bright");
                }
                self.out.add(frames);
                self.print_link(*duration, true);
                self.print_list(offset, true, false);
                self.print_link(*action, false);
                self.out.close();
            }
            Node::VarName { name, array_size } => {
                self.out.open(Some("var-name"));
                self.print_list(array_size, true, false);
                self.out.add_name(name);
                self.out.close();
            }
            Node::Type { array_size } => {
                self.out.open(Some("bad-type"));
                self.print_list(array_size, true, false);
                self.out.close();
            }
            Node::BasicType { array_size, ty, user_type } => {
                self.out.open(Some("basic-type"));
                self.print_list(array_size, true, false);
                self.out.add(ty.name());
                if *ty == BuiltinType::UserType {
                    self.print_list(user_type, false, false);
                }
                self.out.close();
            }
            Node::MapType { array_size, key_type, value_type } => {
                self.out.open(Some("map-type"));
                self.print_list(array_size, true, false);
                self.print_link(*key_type, true);
                self.print_link(*value_type, true);
                self.out.close();
            }
            Node::DynArrayType { array_size, element_type } => {
                self.out.open(Some("dyn-array-type"));
                self.print_list(array_size, true, false);
                self.print_link(*element_type, true);
                self.out.close();
            }
            Node::ClassType { array_size, restriction } => {
                self.out.open(Some("class-type"));
                self.print_list(array_size, true, false);
                self.print_list(restriction, true, false);
                self.out.close();
            }
            Node::Expression { op } => {
                self.out.open(Some(&format!("expr-{}", op.name())));
                self.out.close();
            }
            Node::ExprId { name } => {
                self.out.open(Some("expr-id"));
                self.out.add_name(name);
                self.out.close();
            }
            Node::ExprTypeRef { ty } => {
                self.out.open(Some("expr-type-ref"));
                self.out.add(ty.name());
                self.out.close();
            }
            Node::ExprConstant { value } => {
                self.out.open(Some("expr-const"));
                match value {
                    Constant::Int(v) => self.out.add_int(*v),
                    Constant::Uint(v) => self.out.add_uint(*v),
                    Constant::Float32(v) => self.out.add_float(*v, true),
                    Constant::Float64(v) => self.out.add_float(*v, false),
                    Constant::String(s) => self.out.add_string_literal(s),
                    Constant::Name(n) => self.out.add_name(n),
                    Constant::State(None) => self.out.add("state-nil"),
                    Constant::State(Some(i)) => self.out.add(&format!("state-{i}")),
                }
                self.out.close();
            }
            Node::ExprFuncCall { function, params } => {
                self.out.open(Some("expr-func-call"));
                self.print_link(*function, true);
                self.print_list(params, false, false);
                self.out.close();
            }
            Node::ExprMemberAccess { left, right } => {
                self.out.open(Some("expr-member-access"));
                self.print_link(*left, true);
                self.out.add_name(right);
                self.out.close();
            }
            Node::ExprUnary { op, operand } => {
                self.out.open(Some(&format!("expr-{}", op.name())));
                self.print_link(*operand, false);
                self.out.close();
            }
            Node::ExprBinary { op, left, right } => {
                self.out.open(Some(&format!("expr-{}", op.name())));
                self.print_link(*left, true);
                self.print_link(*right, true);
                self.out.close();
            }
            Node::ExprTrinary { test, left, right } => {
                self.out.open(Some("expr-trinary"));
                self.print_link(*test, true);
                self.print_link(*left, true);
                self.print_link(*right, true);
                self.out.close();
            }
            Node::FuncParam { label, value } => {
                self.out.brk();
                self.out.open(Some("func-parm"));
                self.out.add_name(label);
                self.print_link(*value, false);
                self.out.close();
            }
            Node::Statement => {
                self.out.open(Some("statement"));
                self.out.close();
            }
            Node::CompoundStmt { content } => {
                self.out.brk();
                self.out.open(Some("compound-stmt"));
                self.print_list(content, false, true);
                self.out.close();
            }
            Node::ContinueStmt => {
                self.out.brk();
                self.out.open(Some("continue-stmt"));
                self.out.close();
            }
            Node::BreakStmt => {
                self.out.brk();
                self.out.open(Some("break-stmt"));
                self.out.close();
            }
            Node::ReturnStmt { values } => {
                self.out.brk();
                self.out.open(Some("return-stmt"));
                self.print_list(values, false, false);
                self.out.close();
            }
            Node::ExpressionStmt { expr } => {
                self.out.brk();
                self.out.open(Some("expression-stmt"));
                self.print_link(*expr, false);
                self.out.close();
            }
            Node::IterationStmt { check_at, condition, bumper, statement } => {
                self.out.brk();
                self.out.open(Some("iteration-stmt"));
                self.out.add(match check_at {
                    LoopCheck::Start => "start",
                    LoopCheck::End => "end",
                });
                self.out.brk();
                self.print_link(*condition, true);
                self.out.brk();
                self.print_link(*bumper, true);
                self.out.brk();
                self.print_link(*statement, true);
                self.out.close();
            }
            Node::IfStmt { condition, true_path, false_path } => {
                self.out.brk();
                self.out.open(Some("if-stmt"));
                self.print_link(*condition, true);
                self.out.brk();
                self.print_link(*true_path, true);
                self.out.brk();
                self.print_link(*false_path, true);
                self.out.close();
            }
            Node::SwitchStmt { condition, content } => {
                self.out.brk();
                self.out.open(Some("switch-stmt"));
                self.print_link(*condition, true);
                self.out.brk();
                self.print_list(content, false, false);
                self.out.close();
            }
            Node::CaseStmt { condition } => {
                self.out.brk();
                self.out.open(Some("case-stmt"));
                self.print_link(*condition, false);
                self.out.close();
            }
            Node::AssignStmt { op, dests, sources } => {
                self.out.open(Some("assign-stmt"));
                self.out.add(match op {
                    AssignOp::Assign => "=",
                    AssignOp::Mul => "*=",
                    AssignOp::Div => "/=",
                    AssignOp::Mod => "%=",
                    AssignOp::Add => "+=",
                    AssignOp::Sub => "-=",
                    AssignOp::Shl => "<<=",
                    AssignOp::Shr => ">>=",
                    AssignOp::And => "&=",
                    AssignOp::Or => "|=",
                    AssignOp::Xor => "^=",
                });
                self.print_list(dests, true, false);
                self.print_list(sources, true, false);
                self.out.close();
            }
            Node::LocalVarStmt { ty, vars, inits } => {
                self.out.open(Some("local-var-stmt"));
                self.print_link(*ty, true);
                self.print_list(vars, true, false);
                self.print_list(inits, true, false);
                self.out.close();
            }
            Node::FuncParamDecl { ty, name, flags } => {
                self.out.brk();
                self.out.open(Some("func-param-decl"));
                self.print_link(*ty, true);
                self.out.add_name(name);
                self.out.add_hex(*flags);
                self.out.close();
            }
            Node::ConstantDef { name, value } => {
                self.out.brk();
                self.out.open(Some("constant-def"));
                self.out.add_name(name);
                self.print_link(*value, false);
                self.out.close();
            }
            Node::Declarator { flags, ty } => {
                self.out.brk();
                self.out.open(Some("declarator"));
                self.out.add_hex(*flags);
                self.print_link(*ty, true);
                self.out.close();
            }
            Node::VarDeclarator { flags, ty, names } => {
                self.out.brk();
                self.out.open(Some("var-declarator"));
                self.out.add_hex(*flags);
                self.print_link(*ty, true);
                self.print_list(names, true, false);
                self.out.close();
            }
            Node::FuncDeclarator { flags, ty, name, params, body } => {
                self.out.brk();
                self.out.open(Some("func-declarator"));
                self.out.add_hex(*flags);
                self.print_link(*ty, true);
                self.out.add_name(name);
                self.print_list(params, true, false);
                self.print_link(*body, false);
                self.out.close();
            }
        }
    }
}
