//! The callable-function registry the state compiler resolves action names
//! against. In the engine this is fed by reflection over the native actor
//! classes; scripts can only call what was registered here.

use std::collections::HashMap;

/// Declared parameter types, as the state compiler cares about them.
/// `State` gets the jump-offset special case; `None` marks a variadic tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Bool,
    String,
    Name,
    Sound,
    Color,
    Class,
    State,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub ty: ParamType,
    pub optional: bool,
}

impl ParamSpec {
    pub fn required(ty: ParamType) -> Self {
        Self { ty, optional: false }
    }

    pub fn optional(ty: ParamType) -> Self {
        Self { ty, optional: true }
    }
}

/// A callable's declared signature. `params` includes the implicit leading
/// slots: one for methods (the object), two more for action functions (the
/// calling actor and the state context). Script authors never write those;
/// the parameter parser skips them by count.
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub is_method: bool,
    pub is_action: bool,
}

impl FuncSig {
    pub fn action(name: &str, declared: &[ParamSpec]) -> Self {
        let mut params = vec![
            ParamSpec::required(ParamType::Class),
            ParamSpec::required(ParamType::Class),
            ParamSpec::required(ParamType::State),
        ];
        params.extend_from_slice(declared);
        Self { name: name.to_string(), params, is_method: true, is_action: true }
    }

    pub fn method(name: &str, declared: &[ParamSpec]) -> Self {
        let mut params = vec![ParamSpec::required(ParamType::Class)];
        params.extend_from_slice(declared);
        Self { name: name.to_string(), params, is_method: true, is_action: false }
    }
}

/// Case-insensitive name to signature map.
#[derive(Debug, Default)]
pub struct Registry {
    funcs: HashMap<String, FuncSig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, sig: FuncSig) {
        self.funcs.insert(sig.name.to_ascii_lowercase(), sig);
    }

    /// Lookup by lowercase name.
    pub fn find(&self, lowercase_name: &str) -> Option<&FuncSig> {
        self.funcs.get(lowercase_name)
    }

    /// The stock action functions every actor class can call.
    pub fn with_actor_defaults() -> Self {
        use ParamType::*;
        let mut registry = Self::new();
        registry.define(FuncSig::action(
            "A_CallSpecial",
            &[
                ParamSpec::required(Int),
                ParamSpec::optional(Int),
                ParamSpec::optional(Int),
                ParamSpec::optional(Int),
                ParamSpec::optional(Int),
                ParamSpec::optional(Int),
            ],
        ));
        registry.define(FuncSig::action("A_Look", &[]));
        registry.define(FuncSig::action(
            "A_Chase",
            &[ParamSpec::optional(State), ParamSpec::optional(State), ParamSpec::optional(Int)],
        ));
        registry.define(FuncSig::action("A_FaceTarget", &[]));
        registry.define(FuncSig::action("A_Scream", &[]));
        registry.define(FuncSig::action("A_Pain", &[]));
        registry.define(FuncSig::action("A_NoBlocking", &[]));
        registry.define(FuncSig::action(
            "A_Explode",
            &[ParamSpec::optional(Int), ParamSpec::optional(Int), ParamSpec::optional(Bool)],
        ));
        registry.define(FuncSig::action(
            "A_PlaySound",
            &[
                ParamSpec::required(Sound),
                ParamSpec::optional(Int),
                ParamSpec::optional(Float),
                ParamSpec::optional(Bool),
            ],
        ));
        registry.define(FuncSig::action(
            "A_Jump",
            &[ParamSpec::required(Int), ParamSpec::required(State), ParamSpec::required(None)],
        ));
        registry.define(FuncSig::action(
            "A_SpawnItem",
            &[
                ParamSpec::required(Class),
                ParamSpec::optional(Int),
                ParamSpec::optional(Int),
                ParamSpec::optional(Bool),
                ParamSpec::optional(Bool),
            ],
        ));
        registry.define(FuncSig::action(
            "A_SetTranslucent",
            &[ParamSpec::required(Float), ParamSpec::optional(Int)],
        ));
        registry.define(FuncSig::action(
            "A_CustomMeleeAttack",
            &[
                ParamSpec::optional(Int),
                ParamSpec::optional(Sound),
                ParamSpec::optional(Sound),
            ],
        ));
        registry
    }
}
