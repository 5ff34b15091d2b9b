//! End-to-end expansion behaviour through the public API.

use condmacro_core::{
    Category, ExpandResult, Expander, FuncDef, FunctionTable, MacroError, Param, ParamKind,
    Variables,
};

fn vars() -> Variables {
    [
        ("Ship", "Python"),
        ("Fuel", "16"),
        ("Cargo[1]", "a"),
        ("Cargo[2]", "b"),
        ("Cargo[4]", "d"),
        ("Loop", "%expand(Loop)"),
        ("LoopA", "%indirect(PtrB)"),
        ("LoopB", "%indirect(PtrA)"),
        ("PtrA", "LoopA"),
        ("PtrB", "LoopB"),
    ]
    .into_iter()
    .collect()
}

fn expand(text: &str) -> Result<String, MacroError> {
    let table = FunctionTable::builtin();
    Expander::new(&table, vars()).expand(text)
}

#[test]
fn text_without_macros_is_returned_unchanged() {
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, vars());
    for text in ["", "plain words", "50% of 10", "a $ b", "(%)"] {
        assert_eq!(ex.expand_string(text), ExpandResult::NoExpansion(text.to_string()));
    }
}

#[test]
fn expansions_are_reported_as_such() {
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, vars());
    assert_eq!(
        ex.expand_string("Flying a $Ship"),
        ExpandResult::Expansion("Flying a Python".into())
    );
    assert_eq!(
        ex.expand_string("%upper(nothing)"),
        ExpandResult::Failed("Function upper parameter 1: variable 'nothing' does not exist".into())
    );
}

#[test]
fn int_accepts_integers_only() {
    assert_eq!(expand("%int(\"12\")").unwrap(), "12");
    assert_eq!(expand("%int(Fuel)").unwrap(), "16");
    assert_eq!(
        expand("%int(\"12.5\")").unwrap_err(),
        MacroError::invalid("Parameter must be an integer number")
    );
}

#[test]
fn hnum_scales_to_words() {
    assert_eq!(expand("%hnum(1500000, \"neg;T;B;M;K;H\")").unwrap(), "1.5 M");
    assert_eq!(expand("%hnum(-2500, \"neg;T;B;M;K;H\")").unwrap(), "neg 2 K 5 H");
}

#[test]
fn string_and_numeric_equality() {
    assert_eq!(expand("%ifequal(\"foo\", \"FOO\", \"yes\", \"no\")").unwrap(), "yes");
    assert_eq!(
        expand("%ifnumequal(\"1.0000001\", \"1\", \"yes\", \"no\")").unwrap(),
        "yes"
    );
    assert_eq!(expand("%ifle(Fuel, 16, \"yes\", \"no\")").unwrap(), "yes");
}

#[test]
fn recursion_is_bounded() {
    assert_eq!(expand("%expand(Loop)").unwrap_err(), MacroError::Recursion);
    assert_eq!(expand("%indirect(PtrA)").unwrap_err(), MacroError::Recursion);
    assert_eq!(
        expand("%indirect(PtrA)").unwrap_err().to_string(),
        "Recursion detected - aborting expansion"
    );
}

#[test]
fn expandarray_stops_at_gap() {
    assert_eq!(expand("%expandarray(Cargo, \",\", 1, 5)").unwrap(), "a,b");
}

#[test]
fn nested_calls_and_variables_in_strings() {
    assert_eq!(
        expand("%join(\" / \", \"$Ship\", %lower(Ship), %substring(Ship, 0, 2))").unwrap(),
        "Python / python / Py"
    );
}

fn greet(call: &mut condmacro_core::Call<'_, '_>) -> Result<String, MacroError> {
    Ok(format!("o7 {}", call.value(0)?))
}

static GREET: FuncDef = FuncDef::new(
    "greet",
    greet,
    1,
    1,
    &[ParamKind::VarOrText],
    Category::Misc,
    "Salute",
);

#[test]
fn hosts_can_extend_the_table() {
    let table = FunctionTable::builtin().with(&GREET);
    let mut ex = Expander::new(&table, vars());
    assert_eq!(ex.expand("%GREET(Ship)").unwrap(), "o7 Python");
    assert_eq!(
        ex.call("greet", vec![Param::Literal("Cmdr".into())]).unwrap(),
        "o7 Cmdr"
    );
    assert!(FunctionTable::builtin().find("greet").is_none());
}

#[test]
fn handler_writes_survive_in_the_session() {
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, Variables::new());
    ex.expand("%jsonparse(\"[1,2]\", \"N\")").unwrap();
    let vars = ex.into_variables();
    assert_eq!(vars.get("N_Count"), Some("2"));
    assert_eq!(vars.get("N[1]"), Some("1"));
}
