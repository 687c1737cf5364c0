use serde::{Serialize, Deserialize};

/// Stable index of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena owning every node of one parse session. Nodes are appended and
/// never removed; parents refer to children by `NodeId`, so child lists are
/// plain finite sequences rather than linked sibling chains.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}

/// Class flags.
pub mod class_flags {
    pub const NATIVE: u32 = 1 << 0;
    pub const ABSTRACT: u32 = 1 << 1;
    pub const REPLACES: u32 = 1 << 2;
}

/// Declarator and parameter flags.
pub mod decl_flags {
    pub const NATIVE: u32 = 1 << 0;
    pub const STATIC: u32 = 1 << 1;
    pub const PRIVATE: u32 = 1 << 2;
    pub const PROTECTED: u32 = 1 << 3;
    pub const FINAL: u32 = 1 << 4;
    pub const META: u32 = 1 << 5;
    pub const ACTION: u32 = 1 << 6;
    pub const DEPRECATED: u32 = 1 << 7;
    pub const READONLY: u32 = 1 << 8;
    pub const IN: u32 = 1 << 9;
    pub const OUT: u32 = 1 << 10;
    pub const OPTIONAL: u32 = 1 << 11;
}

/// The built-in type palette of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    IntAuto,
    Bool,
    Float32,
    Float64,
    FloatAuto,
    String,
    Vector2,
    Vector3,
    Vector4,
    Name,
    UserType,
}

impl BuiltinType {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::SInt8 => "sint8",
            BuiltinType::UInt8 => "uint8",
            BuiltinType::SInt16 => "sint16",
            BuiltinType::UInt16 => "uint16",
            BuiltinType::SInt32 => "sint32",
            BuiltinType::UInt32 => "uint32",
            BuiltinType::IntAuto => "intauto",
            BuiltinType::Bool => "bool",
            BuiltinType::Float32 => "float32",
            BuiltinType::Float64 => "float64",
            BuiltinType::FloatAuto => "floatauto",
            BuiltinType::String => "string",
            BuiltinType::Vector2 => "vector2",
            BuiltinType::Vector3 => "vector3",
            BuiltinType::Vector4 => "vector4",
            BuiltinType::Name => "name",
            BuiltinType::UserType => "usertype",
        }
    }
}

/// Expression operation tags. Printed as `expr-<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOp {
    Nil,
    Id,
    Super,
    SelfRef,
    ConstValue,
    FuncCall,
    ArrayAccess,
    MemberAccess,
    PostInc,
    PostDec,
    PreInc,
    PreDec,
    Negate,
    AntiNegate,
    BitNot,
    BoolNot,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    LeftShift,
    RightShift,
    Concat,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    Neq,
    ApproxEq,
    BitAnd,
    BitOr,
    BitXor,
    BoolAnd,
    BoolOr,
    Scope,
    Trinary,
    TypeRef,
}

impl ExprOp {
    pub fn name(self) -> &'static str {
        match self {
            ExprOp::Nil => "nil",
            ExprOp::Id => "id",
            ExprOp::Super => "super",
            ExprOp::SelfRef => "self",
            ExprOp::ConstValue => "const",
            ExprOp::FuncCall => "func-call",
            ExprOp::ArrayAccess => "array-access",
            ExprOp::MemberAccess => "member-access",
            ExprOp::PostInc => "post-inc",
            ExprOp::PostDec => "post-dec",
            ExprOp::PreInc => "pre-inc",
            ExprOp::PreDec => "pre-dec",
            ExprOp::Negate => "negate",
            ExprOp::AntiNegate => "anti-negate",
            ExprOp::BitNot => "bit-not",
            ExprOp::BoolNot => "bool-not",
            ExprOp::Add => "add",
            ExprOp::Sub => "sub",
            ExprOp::Mul => "mul",
            ExprOp::Div => "div",
            ExprOp::Mod => "mod",
            ExprOp::Pow => "pow",
            ExprOp::LeftShift => "lsh",
            ExprOp::RightShift => "rsh",
            ExprOp::Concat => "concat",
            ExprOp::Lt => "lt",
            ExprOp::Gt => "gt",
            ExprOp::LtEq => "lteq",
            ExprOp::GtEq => "gteq",
            ExprOp::Eq => "eq",
            ExprOp::Neq => "neq",
            ExprOp::ApproxEq => "apreq",
            ExprOp::BitAnd => "bit-and",
            ExprOp::BitOr => "bit-or",
            ExprOp::BitXor => "bit-xor",
            ExprOp::BoolAnd => "bool-and",
            ExprOp::BoolOr => "bool-or",
            ExprOp::Scope => "scope",
            ExprOp::Trinary => "trinary",
            ExprOp::TypeRef => "type-ref",
        }
    }
}

/// Literal constants carried by `ExprConstant` nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Uint(u32),
    Float32(f64),
    Float64(f64),
    String(String),
    Name(String),
    /// Resolved state reference: `None` is the null state, `Some(i)` the
    /// state at flat index `i`.
    State(Option<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    And,
    Or,
    Xor,
}

/// Where an iteration statement tests its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCheck {
    Start,
    End,
}

/// One AST node. A closed sum over every node kind of the language, so the
/// printer's dispatch is an exhaustive match.
#[derive(Debug)]
pub enum Node {
    Identifier {
        name: String,
    },

    // Top-level declarations
    Class {
        name: String,
        parent: Vec<NodeId>,
        replaces: Vec<NodeId>,
        flags: u32,
        body: Vec<NodeId>,
    },
    Struct {
        name: String,
        body: Vec<NodeId>,
    },
    Enum {
        name: String,
        ty: BuiltinType,
        elements: Vec<NodeId>,
    },
    EnumTerminator,

    // States, in AST form
    States {
        body: Vec<NodeId>,
    },
    StatePart,
    StateLabel {
        label: String,
    },
    StateStop,
    StateWait,
    StateFail,
    StateLoop,
    StateGoto {
        label: Vec<NodeId>,
        offset: Option<NodeId>,
    },
    StateLine {
        sprite: String,
        frames: String,
        bright: bool,
        duration: Option<NodeId>,
        offset: Vec<NodeId>,
        action: Option<NodeId>,
    },

    VarName {
        name: String,
        array_size: Vec<NodeId>,
    },

    // Type shapes
    Type {
        array_size: Vec<NodeId>,
    },
    BasicType {
        array_size: Vec<NodeId>,
        ty: BuiltinType,
        user_type: Vec<NodeId>,
    },
    MapType {
        array_size: Vec<NodeId>,
        key_type: Option<NodeId>,
        value_type: Option<NodeId>,
    },
    DynArrayType {
        array_size: Vec<NodeId>,
        element_type: Option<NodeId>,
    },
    ClassType {
        array_size: Vec<NodeId>,
        restriction: Vec<NodeId>,
    },

    // Expressions
    Expression {
        op: ExprOp,
    },
    ExprId {
        name: String,
    },
    ExprTypeRef {
        ty: BuiltinType,
    },
    ExprConstant {
        value: Constant,
    },
    ExprFuncCall {
        function: Option<NodeId>,
        params: Vec<NodeId>,
    },
    ExprMemberAccess {
        left: Option<NodeId>,
        right: String,
    },
    ExprUnary {
        op: ExprOp,
        operand: Option<NodeId>,
    },
    ExprBinary {
        op: ExprOp,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    ExprTrinary {
        test: Option<NodeId>,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },

    FuncParam {
        label: String,
        value: Option<NodeId>,
    },

    // Statements
    Statement,
    CompoundStmt {
        content: Vec<NodeId>,
    },
    ContinueStmt,
    BreakStmt,
    ReturnStmt {
        values: Vec<NodeId>,
    },
    ExpressionStmt {
        expr: Option<NodeId>,
    },
    IterationStmt {
        check_at: LoopCheck,
        condition: Option<NodeId>,
        bumper: Option<NodeId>,
        statement: Option<NodeId>,
    },
    IfStmt {
        condition: Option<NodeId>,
        true_path: Option<NodeId>,
        false_path: Option<NodeId>,
    },
    SwitchStmt {
        condition: Option<NodeId>,
        content: Vec<NodeId>,
    },
    CaseStmt {
        condition: Option<NodeId>,
    },
    AssignStmt {
        op: AssignOp,
        dests: Vec<NodeId>,
        sources: Vec<NodeId>,
    },
    LocalVarStmt {
        ty: Option<NodeId>,
        vars: Vec<NodeId>,
        inits: Vec<NodeId>,
    },

    // Declarators
    FuncParamDecl {
        ty: Option<NodeId>,
        name: String,
        flags: u32,
    },
    ConstantDef {
        name: String,
        value: Option<NodeId>,
    },
    Declarator {
        flags: u32,
        ty: Option<NodeId>,
    },
    VarDeclarator {
        flags: u32,
        ty: Option<NodeId>,
        names: Vec<NodeId>,
    },
    FuncDeclarator {
        flags: u32,
        ty: Option<NodeId>,
        name: String,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },
}
