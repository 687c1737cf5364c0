pub mod ast;
pub mod expr;
pub mod printer;

use crate::diagnostics::CompileError;
use crate::lexer::TokenStream;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;
use expr::parse_expression;

/// Parse a source file's declarations into an AST arena plus its roots.
pub fn parse(
    tokens: &[Spanned<Token>],
    source: &str,
) -> Result<(Ast, Vec<NodeId>), CompileError> {
    let mut parser = Parser {
        sc: TokenStream::new(tokens, source),
        ast: Ast::new(),
    };
    let roots = parser.parse_file()?;
    Ok((parser.ast, roots))
}

pub struct Parser<'a> {
    sc: TokenStream<'a>,
    ast: Ast,
}

impl Parser<'_> {
    fn parse_file(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let mut roots = Vec::new();
        while !self.sc.at_end() {
            if self.sc.check("class") || self.sc.check("actor") {
                roots.push(self.parse_class()?);
            } else if self.sc.check("struct") {
                roots.push(self.parse_struct()?);
            } else if self.sc.check("enum") {
                roots.push(self.parse_enum()?);
            } else if self.sc.check("const") {
                roots.push(self.parse_const()?);
            } else {
                let (text, span) = self.sc.get_string()?;
                return Err(CompileError::syntax(
                    format!("expected 'class', 'struct', 'enum', or 'const', found '{text}'"),
                    span,
                ));
            }
        }
        Ok(roots)
    }

    fn parse_class(&mut self) -> Result<NodeId, CompileError> {
        let name = self.sc.expect_ident()?;
        let mut flags = 0u32;
        let parent = if self.sc.check(":") {
            self.parse_dotted_ident()?
        } else {
            Vec::new()
        };
        let mut replaces = Vec::new();
        if self.sc.check("replaces") {
            let target = self.sc.expect_ident()?;
            replaces.push(self.ast.add(Node::Identifier { name: target.node }));
            flags |= class_flags::REPLACES;
        }
        loop {
            if self.sc.check("native") {
                flags |= class_flags::NATIVE;
            } else if self.sc.check("abstract") {
                flags |= class_flags::ABSTRACT;
            } else {
                break;
            }
        }
        self.sc.expect("{")?;
        let body = self.parse_members()?;
        Ok(self.ast.add(Node::Class { name: name.node, parent, replaces, flags, body }))
    }

    fn parse_struct(&mut self) -> Result<NodeId, CompileError> {
        let name = self.sc.expect_ident()?;
        self.sc.expect("{")?;
        let body = self.parse_members()?;
        Ok(self.ast.add(Node::Struct { name: name.node, body }))
    }

    fn parse_enum(&mut self) -> Result<NodeId, CompileError> {
        let name = self.sc.expect_ident()?;
        let ty = if self.sc.check(":") {
            let word = self.sc.expect_ident()?;
            match int_type(&word.node) {
                Some(ty) => ty,
                None => {
                    return Err(CompileError::syntax(
                        format!("expected integer type, found '{}'", word.node),
                        word.span,
                    ));
                }
            }
        } else {
            BuiltinType::IntAuto
        };
        self.sc.expect("{")?;
        let mut elements = Vec::new();
        loop {
            if self.sc.check("}") {
                break;
            }
            let ename = self.sc.expect_ident()?;
            let value = if self.sc.check("=") {
                Some(parse_expression(&mut self.sc, &mut self.ast)?)
            } else {
                None
            };
            elements.push(self.ast.add(Node::ConstantDef { name: ename.node, value }));
            if !self.sc.check(",") {
                self.sc.expect("}")?;
                break;
            }
        }
        if !elements.is_empty() {
            elements.push(self.ast.add(Node::EnumTerminator));
        }
        Ok(self.ast.add(Node::Enum { name: name.node, ty, elements }))
    }

    fn parse_const(&mut self) -> Result<NodeId, CompileError> {
        let name = self.sc.expect_ident()?;
        self.sc.expect("=")?;
        let value = parse_expression(&mut self.sc, &mut self.ast)?;
        self.sc.expect(";")?;
        Ok(self.ast.add(Node::ConstantDef { name: name.node, value: Some(value) }))
    }

    fn parse_members(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let mut body = Vec::new();
        while !self.sc.check("}") {
            if self.sc.at_end() {
                return Err(self.sc.error("unexpected end of file in declaration body"));
            }
            body.push(self.parse_member()?);
        }
        Ok(body)
    }

    fn parse_member(&mut self) -> Result<NodeId, CompileError> {
        if self.sc.check("const") {
            return self.parse_const();
        }
        if self.sc.check("enum") {
            return self.parse_enum();
        }
        if self.sc.check("states") {
            return self.parse_states_ast();
        }
        let flags = self.parse_decl_flags();
        let ty = if self.sc.check("void") {
            None
        } else {
            Some(self.parse_type()?)
        };
        let name = self.sc.expect_ident()?;
        if self.sc.check("(") {
            self.parse_function(flags, ty, name)
        } else {
            let ty = ty.ok_or_else(|| self.sc.error("variables cannot have type 'void'"))?;
            self.parse_var_decl(flags, ty, name)
        }
    }

    fn parse_decl_flags(&mut self) -> u32 {
        let mut flags = 0u32;
        loop {
            if self.sc.check("native") {
                flags |= decl_flags::NATIVE;
            } else if self.sc.check("static") {
                flags |= decl_flags::STATIC;
            } else if self.sc.check("private") {
                flags |= decl_flags::PRIVATE;
            } else if self.sc.check("protected") {
                flags |= decl_flags::PROTECTED;
            } else if self.sc.check("final") {
                flags |= decl_flags::FINAL;
            } else if self.sc.check("meta") {
                flags |= decl_flags::META;
            } else if self.sc.check("action") {
                flags |= decl_flags::ACTION;
            } else if self.sc.check("deprecated") {
                flags |= decl_flags::DEPRECATED;
            } else if self.sc.check("readonly") {
                flags |= decl_flags::READONLY;
            } else {
                return flags;
            }
        }
    }

    fn parse_type(&mut self) -> Result<NodeId, CompileError> {
        if self.sc.check("map") {
            self.sc.expect("<")?;
            let key_type = self.parse_type()?;
            self.sc.expect(",")?;
            let value_type = self.parse_type()?;
            self.sc.expect(">")?;
            return Ok(self.ast.add(Node::MapType {
                array_size: Vec::new(),
                key_type: Some(key_type),
                value_type: Some(value_type),
            }));
        }
        if self.sc.check("array") {
            self.sc.expect("<")?;
            let element_type = self.parse_type()?;
            self.sc.expect(">")?;
            return Ok(self.ast.add(Node::DynArrayType {
                array_size: Vec::new(),
                element_type: Some(element_type),
            }));
        }
        if self.sc.check("class") {
            let mut restriction = Vec::new();
            if self.sc.check("<") {
                restriction = self.parse_dotted_ident()?;
                self.sc.expect(">")?;
            }
            return Ok(self.ast.add(Node::ClassType { array_size: Vec::new(), restriction }));
        }
        let word = self.sc.expect_ident()?;
        let (ty, user_type) = match basic_type(&word.node) {
            Some(ty) => (ty, Vec::new()),
            None => {
                let id = self.ast.add(Node::Identifier { name: word.node });
                (BuiltinType::UserType, vec![id])
            }
        };
        Ok(self.ast.add(Node::BasicType { array_size: Vec::new(), ty, user_type }))
    }

    fn parse_dotted_ident(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let first = self.sc.expect_ident()?;
        let mut nodes = vec![self.ast.add(Node::Identifier { name: first.node })];
        while self.sc.check(".") {
            let next = self.sc.expect_ident()?;
            nodes.push(self.ast.add(Node::Identifier { name: next.node }));
        }
        Ok(nodes)
    }

    fn parse_var_decl(
        &mut self,
        flags: u32,
        ty: NodeId,
        first_name: Spanned<String>,
    ) -> Result<NodeId, CompileError> {
        let mut names = Vec::new();
        let mut name = first_name;
        loop {
            let mut array_size = Vec::new();
            if self.sc.check("[") {
                array_size.push(parse_expression(&mut self.sc, &mut self.ast)?);
                self.sc.expect("]")?;
            }
            names.push(self.ast.add(Node::VarName { name: name.node, array_size }));
            if !self.sc.check(",") {
                break;
            }
            name = self.sc.expect_ident()?;
        }
        self.sc.expect(";")?;
        Ok(self.ast.add(Node::VarDeclarator { flags, ty: Some(ty), names }))
    }

    fn parse_function(
        &mut self,
        flags: u32,
        ty: Option<NodeId>,
        name: Spanned<String>,
    ) -> Result<NodeId, CompileError> {
        let mut params = Vec::new();
        if !self.sc.check(")") {
            loop {
                let mut pflags = 0u32;
                loop {
                    if self.sc.check("in") {
                        pflags |= decl_flags::IN;
                    } else if self.sc.check("out") {
                        pflags |= decl_flags::OUT;
                    } else if self.sc.check("optional") {
                        pflags |= decl_flags::OPTIONAL;
                    } else {
                        break;
                    }
                }
                let pty = self.parse_type()?;
                let pname = self.sc.expect_ident()?;
                params.push(self.ast.add(Node::FuncParamDecl {
                    ty: Some(pty),
                    name: pname.node,
                    flags: pflags,
                }));
                if !self.sc.check(",") {
                    break;
                }
            }
            self.sc.expect(")")?;
        }
        let body = if self.sc.check(";") {
            None
        } else {
            self.sc.expect("{")?;
            Some(self.parse_compound()?)
        };
        Ok(self.ast.add(Node::FuncDeclarator { flags, ty, name: name.node, params, body }))
    }

    fn parse_compound(&mut self) -> Result<NodeId, CompileError> {
        let mut content = Vec::new();
        while !self.sc.check("}") {
            if self.sc.at_end() {
                return Err(self.sc.error("unexpected end of file in statement block"));
            }
            content.push(self.parse_statement()?);
        }
        Ok(self.ast.add(Node::CompoundStmt { content }))
    }

    fn parse_statement(&mut self) -> Result<NodeId, CompileError> {
        if self.sc.check("{") {
            return self.parse_compound();
        }
        if self.sc.check("if") {
            self.sc.expect("(")?;
            let condition = parse_expression(&mut self.sc, &mut self.ast)?;
            self.sc.expect(")")?;
            let true_path = self.parse_statement()?;
            let false_path = if self.sc.check("else") {
                Some(self.parse_statement()?)
            } else {
                None
            };
            return Ok(self.ast.add(Node::IfStmt {
                condition: Some(condition),
                true_path: Some(true_path),
                false_path,
            }));
        }
        if self.sc.check("while") {
            self.sc.expect("(")?;
            let condition = parse_expression(&mut self.sc, &mut self.ast)?;
            self.sc.expect(")")?;
            let statement = self.parse_statement()?;
            return Ok(self.ast.add(Node::IterationStmt {
                check_at: LoopCheck::Start,
                condition: Some(condition),
                bumper: None,
                statement: Some(statement),
            }));
        }
        if self.sc.check("do") {
            let statement = self.parse_statement()?;
            self.sc.expect("while")?;
            self.sc.expect("(")?;
            let condition = parse_expression(&mut self.sc, &mut self.ast)?;
            self.sc.expect(")")?;
            self.sc.expect(";")?;
            return Ok(self.ast.add(Node::IterationStmt {
                check_at: LoopCheck::End,
                condition: Some(condition),
                bumper: None,
                statement: Some(statement),
            }));
        }
        if self.sc.check("for") {
            return self.parse_for();
        }
        if self.sc.check("return") {
            let mut values = Vec::new();
            if !self.sc.check(";") {
                loop {
                    values.push(parse_expression(&mut self.sc, &mut self.ast)?);
                    if !self.sc.check(",") {
                        break;
                    }
                }
                self.sc.expect(";")?;
            }
            return Ok(self.ast.add(Node::ReturnStmt { values }));
        }
        if self.sc.check("break") {
            self.sc.expect(";")?;
            return Ok(self.ast.add(Node::BreakStmt));
        }
        if self.sc.check("continue") {
            self.sc.expect(";")?;
            return Ok(self.ast.add(Node::ContinueStmt));
        }
        if self.sc.check("switch") {
            return self.parse_switch();
        }
        if self.at_local_decl() {
            return self.parse_local_var();
        }
        let stmt = self.parse_expr_or_assign()?;
        self.sc.expect(";")?;
        Ok(stmt)
    }

    fn parse_for(&mut self) -> Result<NodeId, CompileError> {
        self.sc.expect("(")?;
        let init = if self.sc.check(";") {
            None
        } else {
            let stmt = self.parse_expr_or_assign()?;
            self.sc.expect(";")?;
            Some(stmt)
        };
        let condition = if self.sc.check(";") {
            None
        } else {
            let cond = parse_expression(&mut self.sc, &mut self.ast)?;
            self.sc.expect(";")?;
            Some(cond)
        };
        let bumper = if self.sc.check(")") {
            None
        } else {
            let stmt = self.parse_expr_or_assign()?;
            self.sc.expect(")")?;
            Some(stmt)
        };
        let statement = self.parse_statement()?;
        let iter = self.ast.add(Node::IterationStmt {
            check_at: LoopCheck::Start,
            condition,
            bumper,
            statement: Some(statement),
        });
        Ok(match init {
            Some(init) => self.ast.add(Node::CompoundStmt { content: vec![init, iter] }),
            None => iter,
        })
    }

    fn parse_switch(&mut self) -> Result<NodeId, CompileError> {
        self.sc.expect("(")?;
        let condition = parse_expression(&mut self.sc, &mut self.ast)?;
        self.sc.expect(")")?;
        self.sc.expect("{")?;
        let mut content = Vec::new();
        while !self.sc.check("}") {
            if self.sc.at_end() {
                return Err(self.sc.error("unexpected end of file in switch body"));
            }
            if self.sc.check("case") {
                let value = parse_expression(&mut self.sc, &mut self.ast)?;
                self.sc.expect(":")?;
                content.push(self.ast.add(Node::CaseStmt { condition: Some(value) }));
            } else if self.sc.check("default") {
                self.sc.expect(":")?;
                content.push(self.ast.add(Node::CaseStmt { condition: None }));
            } else {
                content.push(self.parse_statement()?);
            }
        }
        Ok(self.ast.add(Node::SwitchStmt { condition: Some(condition), content }))
    }

    fn at_local_decl(&mut self) -> bool {
        let mark = self.sc.mark();
        let result = (|| {
            let Some(t1) = self.sc.get() else {
                return false;
            };
            if !matches!(t1.node, Token::Ident) {
                return false;
            }
            let word = self.sc.text(&t1);
            if basic_type(&word).is_some() || word.eq_ignore_ascii_case("map")
                || word.eq_ignore_ascii_case("array")
            {
                return true;
            }
            matches!(self.sc.get(), Some(t2) if matches!(t2.node, Token::Ident))
        })();
        self.sc.reset(mark);
        result
    }

    fn parse_local_var(&mut self) -> Result<NodeId, CompileError> {
        let ty = self.parse_type()?;
        let mut vars = Vec::new();
        let mut inits = Vec::new();
        loop {
            let name = self.sc.expect_ident()?;
            let mut array_size = Vec::new();
            if self.sc.check("[") {
                array_size.push(parse_expression(&mut self.sc, &mut self.ast)?);
                self.sc.expect("]")?;
            }
            vars.push(self.ast.add(Node::VarName { name: name.node, array_size }));
            if self.sc.check("=") {
                inits.push(parse_expression(&mut self.sc, &mut self.ast)?);
            }
            if !self.sc.check(",") {
                break;
            }
        }
        self.sc.expect(";")?;
        Ok(self.ast.add(Node::LocalVarStmt { ty: Some(ty), vars, inits }))
    }

    fn parse_expr_or_assign(&mut self) -> Result<NodeId, CompileError> {
        let lhs = parse_expression(&mut self.sc, &mut self.ast)?;
        let mark = self.sc.mark();
        let op = match self.sc.get() {
            Some(tok) => match tok.node {
                Token::Eq => Some(AssignOp::Assign),
                Token::PlusEq => Some(AssignOp::Add),
                Token::MinusEq => Some(AssignOp::Sub),
                Token::StarEq => Some(AssignOp::Mul),
                Token::SlashEq => Some(AssignOp::Div),
                Token::PercentEq => Some(AssignOp::Mod),
                Token::AmpEq => Some(AssignOp::And),
                Token::PipeEq => Some(AssignOp::Or),
                Token::CaretEq => Some(AssignOp::Xor),
                Token::ShlEq => Some(AssignOp::Shl),
                Token::ShrEq => Some(AssignOp::Shr),
                _ => None,
            },
            None => None,
        };
        match op {
            Some(op) => {
                let rhs = parse_expression(&mut self.sc, &mut self.ast)?;
                Ok(self.ast.add(Node::AssignStmt { op, dests: vec![lhs], sources: vec![rhs] }))
            }
            None => {
                self.sc.reset(mark);
                Ok(self.ast.add(Node::ExpressionStmt { expr: Some(lhs) }))
            }
        }
    }

    // ── States, in AST form ──────────────────────────────────────────

    fn parse_states_ast(&mut self) -> Result<NodeId, CompileError> {
        self.sc.expect("{")?;
        // Frame strings read backslashes literally; restore whatever mode
        // the file was being read with on every exit path.
        let prev = self.sc.set_escapes(false);
        let result = self.parse_states_body();
        self.sc.set_escapes(prev);
        let body = result?;
        Ok(self.ast.add(Node::States { body }))
    }

    fn parse_states_body(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let mut body = Vec::new();
        loop {
            if self.sc.check("}") {
                break;
            }
            if self.sc.at_end() {
                return Err(self.sc.error("unterminated states block"));
            }
            let (word, span) = self.parse_state_string()?;
            if word.eq_ignore_ascii_case("goto") {
                let (target, _) = self.parse_state_string()?;
                let label = self.label_nodes(&target);
                let offset = if self.sc.check("+") {
                    let (v, _) = self.sc.expect_number()?;
                    Some(self.ast.add(Node::ExprConstant { value: Constant::Int(v) }))
                } else {
                    None
                };
                body.push(self.ast.add(Node::StateGoto { label, offset }));
            } else if word.eq_ignore_ascii_case("stop") {
                body.push(self.ast.add(Node::StateStop));
            } else if word.eq_ignore_ascii_case("wait") {
                body.push(self.ast.add(Node::StateWait));
            } else if word.eq_ignore_ascii_case("fail") {
                body.push(self.ast.add(Node::StateFail));
            } else if word.eq_ignore_ascii_case("loop") {
                body.push(self.ast.add(Node::StateLoop));
            } else {
                let mark = self.sc.mark();
                if matches!(self.sc.get(), Some(tok) if matches!(tok.node, Token::Colon)) {
                    body.push(self.ast.add(Node::StateLabel { label: word }));
                    continue;
                }
                self.sc.reset(mark);
                body.push(self.parse_state_line_ast(word, span)?);
            }
        }
        Ok(body)
    }

    fn parse_state_line_ast(
        &mut self,
        sprite: String,
        span: Span,
    ) -> Result<NodeId, CompileError> {
        if sprite.len() != 4 {
            return Err(CompileError::syntax(
                "Sprite names must be exactly 4 characters",
                span,
            ));
        }
        let (frames, _) = self.sc.get_string()?;
        let duration = parse_expression(&mut self.sc, &mut self.ast)?;
        let mut bright = false;
        let mut offset = Vec::new();
        loop {
            if self.line_word("bright") {
                bright = true;
                continue;
            }
            if self.line_word("offset") {
                self.sc.expect("(")?;
                let x = parse_expression(&mut self.sc, &mut self.ast)?;
                self.sc.expect(",")?;
                let y = parse_expression(&mut self.sc, &mut self.ast)?;
                self.sc.expect(")")?;
                offset = vec![x, y];
                continue;
            }
            break;
        }
        let mark = self.sc.mark();
        let action = match self.sc.get() {
            Some(tok) if !self.sc.crossed() && !matches!(tok.node, Token::RBrace) => {
                self.sc.reset(mark);
                Some(parse_expression(&mut self.sc, &mut self.ast)?)
            }
            _ => {
                self.sc.reset(mark);
                None
            }
        };
        Ok(self.ast.add(Node::StateLine {
            sprite,
            frames,
            bright,
            duration: Some(duration),
            offset,
            action,
        }))
    }

    /// Read a state name that may carry `::scope` and `.sub` qualifiers,
    /// concatenated verbatim.
    fn parse_state_string(&mut self) -> Result<(String, Span), CompileError> {
        let (mut text, span) = self.sc.get_string()?;
        if self.sc.check("::") {
            let (next, _) = self.sc.get_string()?;
            text.push_str("::");
            text.push_str(&next);
        }
        while self.sc.check(".") {
            let (next, _) = self.sc.get_string()?;
            text.push('.');
            text.push_str(&next);
        }
        Ok((text, span))
    }

    /// Consume a word only if it sits on the same line.
    fn line_word(&mut self, word: &str) -> bool {
        let mark = self.sc.mark();
        match self.sc.get() {
            Some(tok) if !self.sc.crossed() && self.sc.text(&tok).eq_ignore_ascii_case(word) => {
                true
            }
            Some(_) => {
                self.sc.reset(mark);
                false
            }
            None => false,
        }
    }

    fn label_nodes(&mut self, composed: &str) -> Vec<NodeId> {
        composed
            .split("::")
            .flat_map(|part| part.split('.'))
            .map(|segment| self.ast.add(Node::Identifier { name: segment.to_string() }))
            .collect()
    }
}

fn int_type(word: &str) -> Option<BuiltinType> {
    Some(match word.to_ascii_lowercase().as_str() {
        "int8" | "sbyte" => BuiltinType::SInt8,
        "uint8" | "byte" => BuiltinType::UInt8,
        "int16" | "short" => BuiltinType::SInt16,
        "uint16" | "ushort" => BuiltinType::UInt16,
        "int" => BuiltinType::SInt32,
        "uint" => BuiltinType::UInt32,
        _ => return None,
    })
}

fn basic_type(word: &str) -> Option<BuiltinType> {
    if let Some(ty) = int_type(word) {
        return Some(ty);
    }
    Some(match word.to_ascii_lowercase().as_str() {
        "bool" => BuiltinType::Bool,
        "float" => BuiltinType::Float32,
        "double" => BuiltinType::Float64,
        "string" => BuiltinType::String,
        "name" => BuiltinType::Name,
        "vector2" => BuiltinType::Vector2,
        "vector3" => BuiltinType::Vector3,
        "vector4" => BuiltinType::Vector4,
        _ => return None,
    })
}
