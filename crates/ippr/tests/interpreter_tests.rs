use ippr::{Error, Interpreter, StatField};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn wrap(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<program language=\"IPPcode23\">\n{body}\n</program>\n"
    )
}

/// Run a program body with the given stdin, capturing stdout.
fn run_with_input(body: &str, input: &str) -> (Result<i32, Error>, String) {
    let mut output = Vec::new();
    let mut diag = Vec::new();
    let result = Interpreter::new()
        .with_input(Cursor::new(input.to_string()))
        .with_output(&mut output)
        .with_diagnostics(&mut diag)
        .run(&wrap(body));
    (result, String::from_utf8(output).unwrap())
}

fn run(body: &str) -> (Result<i32, Error>, String) {
    run_with_input(body, "")
}

fn exit_code_of(body: &str) -> i32 {
    let (result, _) = run(body);
    result.unwrap_err().exit_code()
}

#[test]
fn test_hello_world() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@g</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@g</arg1>
            <arg2 type="string">Hello\032World</arg2>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@g</arg1></instruction>
        <instruction order="4" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "Hello World");
}

#[test]
fn test_floor_division() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@a</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@a</arg1><arg2 type="int">7</arg2>
        </instruction>
        <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@b</arg1></instruction>
        <instruction order="4" opcode="MOVE">
            <arg1 type="var">GF@b</arg1><arg2 type="int">-2</arg2>
        </instruction>
        <instruction order="5" opcode="IDIV">
            <arg1 type="var">GF@a</arg1><arg2 type="var">GF@a</arg2><arg3 type="var">GF@b</arg3>
        </instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="var">GF@a</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "-4");
}

#[test]
fn test_arbitrary_precision_arithmetic() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@big</arg1></instruction>
        <instruction order="2" opcode="MUL">
            <arg1 type="var">GF@big</arg1>
            <arg2 type="int">123456789123456789123456789</arg2>
            <arg3 type="int">1000000000000</arg3>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@big</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "123456789123456789123456789000000000000");
}

#[test]
fn test_popped_frame_returns_as_temporary() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="CREATEFRAME"/>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">TF@x</arg1></instruction>
        <instruction order="3" opcode="PUSHFRAME"/>
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">LF@y</arg1></instruction>
        <instruction order="5" opcode="MOVE">
            <arg1 type="var">LF@y</arg1><arg2 type="int">1</arg2>
        </instruction>
        <instruction order="6" opcode="POPFRAME"/>
        <instruction order="7" opcode="WRITE"><arg1 type="var">TF@y</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "1");
}

#[test]
fn test_call_and_return() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="LABEL"><arg1 type="label">main</arg1></instruction>
        <instruction order="2" opcode="CALL"><arg1 type="label">f</arg1></instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="string">after</arg1></instruction>
        <instruction order="4" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
        <instruction order="5" opcode="LABEL"><arg1 type="label">f</arg1></instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="string">in\032</arg1></instruction>
        <instruction order="7" opcode="RETURN"/>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "in after");
}

#[test]
fn test_division_by_zero() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@a</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@a</arg1><arg2 type="int">1</arg2>
        </instruction>
        <instruction order="3" opcode="IDIV">
            <arg1 type="var">GF@a</arg1><arg2 type="var">GF@a</arg2><arg3 type="int">0</arg3>
        </instruction>
    "#);
    assert_eq!(result.unwrap_err().exit_code(), 57);
    assert_eq!(out, "");
}

#[test]
fn test_nil_equality() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@n</arg1></instruction>
        <instruction order="3" opcode="MOVE">
            <arg1 type="var">GF@n</arg1><arg2 type="nil">nil</arg2>
        </instruction>
        <instruction order="4" opcode="EQ">
            <arg1 type="var">GF@r</arg1><arg2 type="var">GF@n</arg2><arg3 type="nil">nil</arg3>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "true");
}

#[test]
fn test_write_formats() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="WRITE"><arg1 type="bool">true</arg1></instruction>
        <instruction order="2" opcode="WRITE"><arg1 type="int">-5</arg1></instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="nil">nil</arg1></instruction>
        <instruction order="4" opcode="WRITE"><arg1 type="string">a\035b\092c</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "true-5a#b\\c");
}

#[test]
fn test_data_stack_preserves_values_and_types() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="PUSHS"><arg1 type="int">5</arg1></instruction>
        <instruction order="2" opcode="PUSHS"><arg1 type="bool">true</arg1></instruction>
        <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">GF@b</arg1></instruction>
        <instruction order="5" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="6" opcode="POPS"><arg1 type="var">GF@b</arg1></instruction>
        <instruction order="7" opcode="POPS"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="8" opcode="TYPE">
            <arg1 type="var">GF@t</arg1><arg2 type="var">GF@b</arg2>
        </instruction>
        <instruction order="9" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="10" opcode="TYPE">
            <arg1 type="var">GF@t</arg1><arg2 type="var">GF@i</arg2>
        </instruction>
        <instruction order="11" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "boolint");
}

#[test]
fn test_stack_underflow() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="POPS"><arg1 type="var">GF@x</arg1></instruction>
        "#),
        56
    );
    assert_eq!(exit_code_of(r#"<instruction order="1" opcode="RETURN"/>"#), 56);
}

#[test]
fn test_uninitialised_read() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="WRITE"><arg1 type="var">GF@x</arg1></instruction>
        "#),
        56
    );
}

#[test]
fn test_undeclared_variable() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="WRITE"><arg1 type="var">GF@ghost</arg1></instruction>
        "#),
        54
    );
}

#[test]
fn test_missing_frame_takes_precedence_over_declaration() {
    // TF does not exist: 55, not 54, even though the name is undeclared too.
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="WRITE"><arg1 type="var">TF@x</arg1></instruction>
        "#),
        55
    );
    assert_eq!(exit_code_of(r#"<instruction order="1" opcode="PUSHFRAME"/>"#), 55);
    assert_eq!(exit_code_of(r#"<instruction order="1" opcode="POPFRAME"/>"#), 55);
}

#[test]
fn test_variable_redeclaration() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
        "#),
        52
    );
}

#[test]
fn test_label_errors() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="JUMP"><arg1 type="label">nowhere</arg1></instruction>
        "#),
        52
    );
    // Duplicate labels are caught in the pre-pass, before anything runs.
    let (result, out) = run(r#"
        <instruction order="1" opcode="WRITE"><arg1 type="string">x</arg1></instruction>
        <instruction order="2" opcode="LABEL"><arg1 type="label">l</arg1></instruction>
        <instruction order="3" opcode="LABEL"><arg1 type="label">l</arg1></instruction>
    "#);
    assert_eq!(result.unwrap_err().exit_code(), 52);
    assert_eq!(out, "");
}

#[test]
fn test_jump_label_checked_even_when_not_taken() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="JUMPIFEQ">
                <arg1 type="label">nowhere</arg1>
                <arg2 type="int">1</arg2>
                <arg3 type="int">2</arg3>
            </instruction>
        "#),
        52
    );
}

#[test]
fn test_conditional_jumps() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="JUMPIFNEQ">
            <arg1 type="label">skip</arg1>
            <arg2 type="int">1</arg2>
            <arg3 type="int">2</arg3>
        </instruction>
        <instruction order="2" opcode="WRITE"><arg1 type="string">not-printed</arg1></instruction>
        <instruction order="3" opcode="LABEL"><arg1 type="label">skip</arg1></instruction>
        <instruction order="4" opcode="JUMPIFEQ">
            <arg1 type="label">end</arg1>
            <arg2 type="nil">nil</arg2>
            <arg3 type="int">2</arg3>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="string">printed</arg1></instruction>
        <instruction order="6" opcode="LABEL"><arg1 type="label">end</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "printed");
}

#[test]
fn test_type_mismatches() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="ADD">
                <arg1 type="var">GF@x</arg1><arg2 type="int">1</arg2><arg3 type="bool">true</arg3>
            </instruction>
        "#),
        53
    );
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="LT">
                <arg1 type="var">GF@x</arg1><arg2 type="nil">nil</arg2><arg3 type="nil">nil</arg3>
            </instruction>
        "#),
        53
    );
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="EQ">
                <arg1 type="var">GF@x</arg1><arg2 type="int">1</arg2><arg3 type="string">1</arg3>
            </instruction>
        "#),
        53
    );
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="EXIT"><arg1 type="string">0</arg1></instruction>
        "#),
        53
    );
}

#[test]
fn test_string_relational_order() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="2" opcode="LT">
            <arg1 type="var">GF@r</arg1>
            <arg2 type="string">abc</arg2>
            <arg3 type="string">abd</arg3>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="4" opcode="GT">
            <arg1 type="var">GF@r</arg1>
            <arg2 type="bool">true</arg2>
            <arg3 type="bool">false</arg3>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "truetrue");
}

#[test]
fn test_string_instructions() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@s</arg1></instruction>
        <instruction order="2" opcode="CONCAT">
            <arg1 type="var">GF@s</arg1>
            <arg2 type="string">abc</arg2>
            <arg3 type="string">def</arg3>
        </instruction>
        <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@n</arg1></instruction>
        <instruction order="4" opcode="STRLEN">
            <arg1 type="var">GF@n</arg1><arg2 type="var">GF@s</arg2>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@n</arg1></instruction>
        <instruction order="6" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="7" opcode="GETCHAR">
            <arg1 type="var">GF@c</arg1><arg2 type="var">GF@s</arg2><arg3 type="int">3</arg3>
        </instruction>
        <instruction order="8" opcode="WRITE"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="9" opcode="SETCHAR">
            <arg1 type="var">GF@s</arg1><arg2 type="int">0</arg2><arg3 type="string">X</arg3>
        </instruction>
        <instruction order="10" opcode="WRITE"><arg1 type="var">GF@s</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "6dXbcdef");
}

#[test]
fn test_string_range_faults() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
            <instruction order="2" opcode="GETCHAR">
                <arg1 type="var">GF@c</arg1><arg2 type="string">ab</arg2><arg3 type="int">2</arg3>
            </instruction>
        "#),
        58
    );
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
            <instruction order="2" opcode="STRI2INT">
                <arg1 type="var">GF@c</arg1><arg2 type="string">ab</arg2><arg3 type="int">-1</arg3>
            </instruction>
        "#),
        58
    );
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@s</arg1></instruction>
            <instruction order="2" opcode="MOVE">
                <arg1 type="var">GF@s</arg1><arg2 type="string">ab</arg2>
            </instruction>
            <instruction order="3" opcode="SETCHAR">
                <arg1 type="var">GF@s</arg1><arg2 type="int">0</arg2><arg3 type="string"></arg3>
            </instruction>
        "#),
        58
    );
}

#[test]
fn test_conversions() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="2" opcode="INT2CHAR">
            <arg1 type="var">GF@c</arg1><arg2 type="int">269</arg2>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="5" opcode="STRI2INT">
            <arg1 type="var">GF@i</arg1><arg2 type="string">A</arg2><arg3 type="int">0</arg3>
        </instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="var">GF@i</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "\u{10d}65");
}

#[test]
fn test_invalid_code_point() {
    assert_eq!(
        exit_code_of(r#"
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
            <instruction order="2" opcode="INT2CHAR">
                <arg1 type="var">GF@c</arg1><arg2 type="int">1114112</arg2>
            </instruction>
        "#),
        58
    );
}

#[test]
fn test_logical_instructions() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="2" opcode="AND">
            <arg1 type="var">GF@r</arg1><arg2 type="bool">true</arg2><arg3 type="bool">false</arg3>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="4" opcode="OR">
            <arg1 type="var">GF@r</arg1><arg2 type="var">GF@r</arg2><arg3 type="bool">true</arg3>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="6" opcode="NOT">
            <arg1 type="var">GF@r</arg1><arg2 type="var">GF@r</arg2>
        </instruction>
        <instruction order="7" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "falsetruefalse");
}

#[test]
fn test_read_each_type() {
    let body = r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="2" opcode="READ">
            <arg1 type="var">GF@i</arg1><arg2 type="type">int</arg2>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">GF@b</arg1></instruction>
        <instruction order="5" opcode="READ">
            <arg1 type="var">GF@b</arg1><arg2 type="type">bool</arg2>
        </instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="var">GF@b</arg1></instruction>
        <instruction order="7" opcode="DEFVAR"><arg1 type="var">GF@s</arg1></instruction>
        <instruction order="8" opcode="READ">
            <arg1 type="var">GF@s</arg1><arg2 type="type">string</arg2>
        </instruction>
        <instruction order="9" opcode="WRITE"><arg1 type="var">GF@s</arg1></instruction>
    "#;
    let (result, out) = run_with_input(body, "-42\nTRUE\nhello there\n");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "-42truehello there");
}

#[test]
fn test_read_bad_and_missing_input() {
    // Unparsable int becomes nil; WRITE of nil prints nothing, TYPE says "nil".
    let body = r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@v</arg1></instruction>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="3" opcode="READ">
            <arg1 type="var">GF@v</arg1><arg2 type="type">int</arg2>
        </instruction>
        <instruction order="4" opcode="TYPE">
            <arg1 type="var">GF@t</arg1><arg2 type="var">GF@v</arg2>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="6" opcode="READ">
            <arg1 type="var">GF@v</arg1><arg2 type="type">bool</arg2>
        </instruction>
        <instruction order="7" opcode="WRITE"><arg1 type="var">GF@v</arg1></instruction>
        <instruction order="8" opcode="READ">
            <arg1 type="var">GF@v</arg1><arg2 type="type">string</arg2>
        </instruction>
        <instruction order="9" opcode="TYPE">
            <arg1 type="var">GF@t</arg1><arg2 type="var">GF@v</arg2>
        </instruction>
        <instruction order="10" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
    "#;
    // Line 1: not an int -> nil. Line 2: not a bool token -> false.
    // Line 3: missing (EOF) -> nil.
    let (result, out) = run_with_input(body, "seven\nmaybe\n");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "nilfalsenil");
}

#[test]
fn test_type_of_uninitialised_is_empty() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="3" opcode="TYPE">
            <arg1 type="var">GF@t</arg1><arg2 type="var">GF@x</arg2>
        </instruction>
        <instruction order="4" opcode="WRITE"><arg1 type="string">[</arg1></instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="string">]</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "[]");
}

#[test]
fn test_exit_code_range() {
    let (result, _) = run(r#"<instruction order="1" opcode="EXIT"><arg1 type="int">49</arg1></instruction>"#);
    assert_eq!(result.unwrap(), 49);

    assert_eq!(
        exit_code_of(r#"<instruction order="1" opcode="EXIT"><arg1 type="int">50</arg1></instruction>"#),
        57
    );
    assert_eq!(
        exit_code_of(r#"<instruction order="1" opcode="EXIT"><arg1 type="int">-1</arg1></instruction>"#),
        57
    );
}

#[test]
fn test_exit_stops_execution() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="WRITE"><arg1 type="string">before</arg1></instruction>
        <instruction order="2" opcode="EXIT"><arg1 type="int">3</arg1></instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="string">after</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 3);
    assert_eq!(out, "before");
}

#[test]
fn test_dprint_and_break_do_not_touch_stdout() {
    let mut output = Vec::new();
    let mut diag = Vec::new();
    let result = Interpreter::new()
        .with_input(Cursor::new(String::new()))
        .with_output(&mut output)
        .with_diagnostics(&mut diag)
        .run(&wrap(r#"
            <instruction order="1" opcode="DPRINT"><arg1 type="int">7</arg1></instruction>
            <instruction order="2" opcode="BREAK"/>
            <instruction order="3" opcode="WRITE"><arg1 type="string">ok</arg1></instruction>
        "#));
    assert_eq!(result.unwrap(), 0);
    assert_eq!(String::from_utf8(output).unwrap(), "ok");
    let diag = String::from_utf8(diag).unwrap();
    assert!(diag.starts_with('7'));
    assert!(diag.contains("break at order 2"));
}

#[test]
fn test_loop_counts_into_stats() {
    let mut output = Vec::new();
    let mut interpreter = Interpreter::new()
        .with_input(Cursor::new(String::new()))
        .with_output(&mut output)
        .with_diagnostics(std::io::sink());
    let result = interpreter.run(&wrap(r#"
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@i</arg1><arg2 type="int">3</arg2>
        </instruction>
        <instruction order="3" opcode="LABEL"><arg1 type="label">loop</arg1></instruction>
        <instruction order="4" opcode="SUB">
            <arg1 type="var">GF@i</arg1><arg2 type="var">GF@i</arg2><arg3 type="int">1</arg3>
        </instruction>
        <instruction order="5" opcode="JUMPIFNEQ">
            <arg1 type="label">loop</arg1><arg2 type="var">GF@i</arg2><arg3 type="int">0</arg3>
        </instruction>
    "#));
    assert_eq!(result.unwrap(), 0);

    let stats = interpreter.stats();
    // DEFVAR + MOVE + 3x(SUB + JUMPIFNEQ); LABEL is not counted.
    assert_eq!(stats.insts(), 8);
    assert_eq!(stats.vars(), 1);
    // SUB and JUMPIFNEQ tie at three runs each; the lower order wins.
    assert_eq!(stats.hot(), Some(4));

    let mut report = Vec::new();
    stats
        .write_report(
            &[StatField::Insts, StatField::Hot, StatField::Eol, StatField::Frequent],
            &mut report,
        )
        .unwrap();
    assert_eq!(String::from_utf8(report).unwrap(), "8\n4\n\nDEFVAR,JUMPIFNEQ,LABEL,MOVE,SUB\n");
}

#[test]
fn test_source_format_errors() {
    let naked = Interpreter::new()
        .with_input(Cursor::new(String::new()))
        .with_output(std::io::sink())
        .with_diagnostics(std::io::sink())
        .run("this is not xml");
    assert_eq!(naked.unwrap_err().exit_code(), 31);

    assert_eq!(
        exit_code_of(r#"<instruction order="1" opcode="SWAP"/>"#),
        32
    );
    assert_eq!(
        exit_code_of(r#"<instruction order="1" opcode="WRITE"><arg1 type="int">x1</arg1></instruction>"#),
        32
    );
    assert_eq!(
        exit_code_of(r#"<instruction order="1" opcode="MOVE"><arg1 type="var">GF@x</arg1></instruction>"#),
        32
    );
}

#[test]
fn test_case_insensitive_opcodes() {
    let (result, out) = run(r#"
        <instruction order="1" opcode="write"><arg1 type="string">ok</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "ok");
}

#[test]
fn test_orders_are_a_sort_key_with_gaps() {
    let (result, out) = run(r#"
        <instruction order="30" opcode="WRITE"><arg1 type="string">c</arg1></instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="string">a</arg1></instruction>
        <instruction order="12" opcode="WRITE"><arg1 type="string">b</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "abc");
}

#[test]
fn test_createframe_overwrites_but_keeps_local_frames() {
    // A fresh TF while a pushed frame is on the local stack leaves LF alone.
    let (result, out) = run(r#"
        <instruction order="1" opcode="CREATEFRAME"/>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">TF@x</arg1></instruction>
        <instruction order="3" opcode="MOVE">
            <arg1 type="var">TF@x</arg1><arg2 type="string">local</arg2>
        </instruction>
        <instruction order="4" opcode="PUSHFRAME"/>
        <instruction order="5" opcode="CREATEFRAME"/>
        <instruction order="6" opcode="DEFVAR"><arg1 type="var">TF@x</arg1></instruction>
        <instruction order="7" opcode="MOVE">
            <arg1 type="var">TF@x</arg1><arg2 type="string">temp</arg2>
        </instruction>
        <instruction order="8" opcode="WRITE"><arg1 type="var">LF@x</arg1></instruction>
        <instruction order="9" opcode="WRITE"><arg1 type="var">TF@x</arg1></instruction>
    "#);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out, "localtemp");
}
