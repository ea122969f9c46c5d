// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use fanuc_ngc::ast::{Address, Func};
use fanuc_ngc::eval::*;

fn load(body: &str) -> Program {
    let src = format!("%\nO9874(TestProg)\n{}\n%", body);
    Program::from_source("testfile", &src).unwrap()
}

fn run(body: &str) -> Interpreter<SimMachine> {
    let mut interp = Interpreter::new(SimMachine::new());
    interp.run_program(load(body)).unwrap();
    interp
}

fn run_err(body: &str) -> EvalError {
    let mut interp = Interpreter::new(SimMachine::new());
    interp.run_program(load(body)).unwrap_err()
}

fn var(interp: &Interpreter<SimMachine>, index: u32) -> Option<f64> {
    interp.get_variable(index).unwrap()
}

#[test]
fn test_empty_blocks() {
    let interp = run("N10\n\n(Just a comment)\nN20 (This is label 20)\nN30\nN40 (This is label 40)");
    assert_eq!(interp.state(), State::Halted);
    assert!(interp.machine().commands.is_empty());
}

#[test]
fn test_basic_assignment() {
    let interp = run("#1=#0\n#2=4.9\n#3=12\n#4=#2\n#5=#3\n#6=-23.2\n#7=+25.7\n#8=+3.\n#9=-2");
    assert_eq!(var(&interp, 1), None);
    assert_eq!(var(&interp, 2), Some(4.9));
    assert_eq!(var(&interp, 3), Some(12.));
    assert_eq!(var(&interp, 4), Some(4.9));
    assert_eq!(var(&interp, 5), Some(12.));
    assert_eq!(var(&interp, 6), Some(-23.2));
    assert_eq!(var(&interp, 7), Some(25.7));
    assert_eq!(var(&interp, 8), Some(3.));
    assert_eq!(var(&interp, 9), Some(-2.));
}

#[test]
fn test_control_flow_and_variable_range() {
    let interp = run(r#"#33=#0
(This line is just a simple test of IF-THEN)
IF[#33EQ#0]THEN[#33=1]

(Fill vars 1-33 with their index numbers)
N10
IF[#33GT33]GOTO20
#[#33]=#33
#33=#33+1
GOTO10
N20
#33=33

(Fill vars 100-199 with their index numbers)
#199=100
N30
IF[#199GT199]GOTO40
#[#199]=#199
#199=#199+1
GOTO30
N40
#199=199

(Fill vars 500-999 with their index numbers)
#999=500
N50
IF[#999GT999]GOTO60
#[#999]=#999
#999=#999+1
GOTO50
N60
#999=999"#);

    for index in (1..=33).chain(100..=199).chain(500..=999) {
        assert_eq!(var(&interp, index), Some(index as f64), "#{}", index);
    }
}

#[test]
fn test_invalid_variables() {
    for (body, lineno, errtype) in vec![
        ("#0=42.899", 3, ErrType::InvalidVariableAccess(0)),
        ("#237=-99.876", 3, ErrType::InvalidVariableAccess(237)),
        ("#2=#460", 3, ErrType::InvalidVariableAccess(460)),
        ("#2=#470-5", 3, ErrType::InvalidVariableAccess(470)),
        ("#1=-5\n#[#1]=56.4", 4, ErrType::InvalidVariableAccess(-5)),
        ("#1=-5\n#2=#[#1]", 4, ErrType::InvalidVariableAccess(-5)),
        ("#1=#[2.5]", 3, ErrType::InvalidVariableNumber(2.5)),
    ] {
        let err = run_err(body);
        assert_eq!(err.lineno, lineno, "{}", body);
        assert_eq!(err.errtype, errtype, "{}", body);
        assert_eq!(err.program, "O9874");
    }
}

#[test]
fn test_error_display() {
    let err = run_err("#237=-99.876");
    assert_eq!(err.to_string(), "Error in O9874: Line 3, col 1. Variable #237 cannot be accessed");
}

#[test]
fn test_relational_operators_with_undefined() {
    let interp = run(r#"#1=#0
#2=1.
#3=2.
#4=0

(All these should evaluate to true)
IF[#1EQ#0]THEN[#4=[#4+1]]
IF[#2EQ1]THEN[#4=[#4+1]]
IF[#0NE#2]THEN[#4=[#4+1]]
IF[#2NE3.2]THEN[#4=[#4+1]]
IF[#3GT#2]THEN[#4=[#4+1]]
IF[#3GE#2]THEN[#4=[#4+1]]
IF[#1GE#0]THEN[#4=[#4+1]]
IF[#2LT#3]THEN[#4=[#4+1]]
IF[#2LE#3]THEN[#4=[#4+1]]
IF[#1LE#0]THEN[#4=[#4+1]]

(These should evaluate to false)
IF[#1GT#0]THEN[#4=[#4+1]]
IF[#0LT#2]THEN[#4=[#4+1]]"#);
    assert_eq!(var(&interp, 4), Some(10.));
}

#[test]
fn test_operator_precedence() {
    let interp = run("#1=1+2*3-4/4 (This should evaluate to 6)\n#2=1+[2*3]-[4/4]\n#3=2*[3+4] MOD 4");
    assert_eq!(var(&interp, 1), Some(6.));
    assert_eq!(var(&interp, 2), Some(6.));
    assert_eq!(var(&interp, 3), Some(2.));
}

#[test]
fn test_arithmetic_with_undefined() {
    let interp = run(r#"#1=#0
#4=0

(All these should evaluate to true)
IF[[1+#0]EQ#0]THEN[#4=[#4+1]]
IF[[#0-7]EQ#0]THEN[#4=[#4+1]]
IF[[2*#1]EQ#0]THEN[#4=[#4+1]]
IF[[#1/6]EQ#0]THEN[#4=[#4+1]]
IF[[#1MOD#0]EQ#0]THEN[#4=[#4+1]]"#);
    assert_eq!(var(&interp, 4), Some(5.));
}

#[test]
fn test_assignment_with_undefined() {
    let interp = run("#1=#0\n#2=#1\n#3=[#0-2]+4\n#4=#1*4\n#5=[#1]\n#6=-#0");
    assert_eq!(var(&interp, 2), None);
    assert_eq!(var(&interp, 3), Some(0.));
    assert_eq!(var(&interp, 4), Some(0.));
    assert_eq!(var(&interp, 5), None);
    assert_eq!(var(&interp, 6), Some(0.));
}

#[test]
fn test_negation() {
    let interp = run("#1=4\n#2=-[#1-2]\n#3=+[3*#1]\n#4=--#1");
    assert_eq!(var(&interp, 2), Some(-2.));
    assert_eq!(var(&interp, 3), Some(12.));
    assert_eq!(var(&interp, 4), Some(4.));
}

#[test]
fn test_functions_and_logic() {
    let interp = run("#1=ATAN[1]/[1]\n#2=SQRT[9]+ABS[-1]\n#3=FIX[2.7]\n#4=FUP[2.2]\n\
                      IF[[1LT2]AND NOT[0]]THEN#5=1\nIF[NOT[2]]THEN#6=1");
    assert!((var(&interp, 1).unwrap() - 45.).abs() < 1e-9);
    assert_eq!(var(&interp, 2), Some(4.));
    assert_eq!(var(&interp, 3), Some(2.));
    assert_eq!(var(&interp, 4), Some(3.));
    assert_eq!(var(&interp, 5), None);
    assert_eq!(var(&interp, 6), Some(1.));

    let err = run_err("#1=1\nIF[#1]GOTO10\nN10");
    assert_eq!(err.lineno, 4);
    assert!(matches!(err.errtype, ErrType::TypeMismatch(..)));
    assert_eq!(run_err("#1=1/0").errtype, ErrType::DivisionByZero);
    assert_eq!(var(&run("#1=#0/0"), 1), Some(0.));

    // results must stay representable
    assert_eq!(run_err("#1=EXP[1000]").errtype, ErrType::InvalidFunctionArgument(Func::Exp, 1000.));
    assert_eq!(run_err("#1=EXP[700]\n#2=#1*#1").errtype, ErrType::Overflow);
}

#[test]
fn test_goto() {
    let interp = run("#1=20\nGOTO#1\n#2=1\nN20 #3=1\nGOTO[#1+10]\n#4=1\nN30");
    assert_eq!(var(&interp, 2), None);
    assert_eq!(var(&interp, 3), Some(1.));
    assert_eq!(var(&interp, 4), None);

    // a block can jump to itself
    let interp = run("#1=0\nN5 #1=#1+1\nIF[#1LT10]GOTO5");
    assert_eq!(var(&interp, 1), Some(10.));

    let err = run_err("#1=1\nGOTO99");
    assert_eq!(err.lineno, 4);
    assert_eq!(err.errtype, ErrType::UndefinedLabel(99));
    assert_eq!(run_err("GOTO#1").errtype, ErrType::TypeMismatch("a sequence number", Value::Undefined));

    // every sequence number that loads is a valid jump target
    let interp = run("#1=1\nN99999 #1=#1+1\nIF[#1LT3]GOTO99999");
    assert_eq!(var(&interp, 1), Some(3.));
    assert!(Program::from_source("testfile", "N100000\n#1=1").is_err());
}

#[test]
fn test_while_loops() {
    let interp = run(r#"#1=0
#2=0
WHILE[#1LT5]DO1
#1=#1+1
#2=#2+#1
END1
#3=0
WHILE[#3GT0]DO1
#4=1
END1
#5=0
#6=0
WHILE[#5LT3]DO1
#5=#5+1
#7=0
WHILE[#7LT4]DO2
#7=#7+1
#6=#6+1
END2
END1"#);
    assert_eq!(var(&interp, 1), Some(5.));
    assert_eq!(var(&interp, 2), Some(15.));
    assert_eq!(var(&interp, 4), None);
    assert_eq!(var(&interp, 6), Some(12.));
}

#[test]
fn test_unbalanced_loops() {
    let errors = Program::from_source("testfile", "%\nO1\nWHILE[#1LT3]DO1\nEND2\n%").unwrap_err();
    assert!(errors.iter().any(|e| e.lineno == 4));
    assert!(Program::from_source("testfile", "N10\nN10").is_err());
}

#[test]
fn test_machine_commands() {
    let interp = run("#1=200\nG01 X1.5 F#1 S1000 T2 M03 Y-[1+1]\nG43.4");
    assert_eq!(interp.machine().commands, vec![
        Command::GCode(GCode(10)),
        Command::FeedRate(200.),
        Command::SpindleSpeed(1000.),
        Command::ToolSelect(2),
        Command::Word(Address::X, 1.5),
        Command::Word(Address::Y, -2.),
        Command::MCode(3),
        Command::GCode(GCode(434)),
    ]);
    assert_eq!(interp.machine().feedrate, 200.);
    assert_eq!(interp.machine().tool, Some(2));
}

#[test]
fn test_word_errors() {
    let err = run_err("G01 X1 X2");
    assert_eq!(err.errtype, ErrType::RepeatedAddress(Address::X));
    assert_eq!(err.col, Some(8));

    let err = run_err("G00 G01 X1");
    assert_eq!(err.errtype, ErrType::ConflictingGCodes("motion", 0, 10));
    assert_eq!(err.errtype.to_string(), "G00 and G01 of group motion cannot be used together");

    assert_eq!(run_err("F#1").errtype, ErrType::UndefinedAddress(Address::F));
    assert_eq!(run_err("G1.25").errtype, ErrType::InvalidGCode(1.25));
    assert_eq!(run_err("T-1").errtype, ErrType::InvalidTool(-1.));
    assert!(matches!(run_err("F-10").errtype, ErrType::Machine(_)));
}

#[test]
fn test_end_of_program() {
    let interp = run("#1=1\nM30\n#1=2");
    assert_eq!(var(&interp, 1), Some(1.));
    assert_eq!(interp.machine().commands, vec![Command::MCode(30)]);

    let interp = run("#1=1\nM02\n#1=2");
    assert_eq!(var(&interp, 1), Some(1.));
}

#[test]
fn test_block_delete() {
    let interp = run("/#1=1\n#2=2");
    assert_eq!(var(&interp, 1), Some(1.));

    let config = Config { block_delete: true, ..Config::default() };
    let mut interp = Interpreter::with_config(SimMachine::new(), config);
    interp.run_program(load("/#1=1\n#2=2")).unwrap();
    assert_eq!(interp.get_variable(1), Ok(None));
    assert_eq!(interp.get_variable(2), Ok(Some(2.)));
}

#[test]
fn test_step_limit() {
    let config = Config { step_limit: Some(100), ..Config::default() };
    let mut interp = Interpreter::with_config(SimMachine::new(), config);
    let err = interp.run_program(load("N10 GOTO10")).unwrap_err();
    assert_eq!(err.errtype, ErrType::StepLimitExceeded(100));
    assert_eq!(err.lineno, 3);
    assert_eq!(interp.state(), State::Halted);
}

#[test]
fn test_stepping() {
    let mut interp = Interpreter::new(SimMachine::new());
    assert_eq!(interp.step(), Ok(State::Halted));

    interp.load(load("#1=1\n#2=#1+1"));
    assert_eq!(interp.state(), State::Running(0));
    assert_eq!(interp.step(), Ok(State::Running(1)));
    assert_eq!(interp.get_variable(1), Ok(Some(1.)));
    assert_eq!(interp.get_variable(2), Ok(None));
    assert_eq!(interp.step(), Ok(State::Halted));
    assert_eq!(interp.get_variable(2), Ok(Some(2.)));
    assert_eq!(interp.step(), Ok(State::Halted));
}

#[test]
fn test_errors_halt() {
    let mut interp = Interpreter::new(SimMachine::new());
    interp.load(load("#1=1/0\n#2=1"));
    assert!(interp.step().is_err());
    assert_eq!(interp.state(), State::Halted);
    assert_eq!(interp.step(), Ok(State::Halted));
    assert_eq!(interp.get_variable(2), Ok(None));
}

#[test]
fn test_variables_across_programs() {
    let mut interp = Interpreter::new(SimMachine::new());
    interp.set_variable(500, Some(7.)).unwrap();
    assert_eq!(interp.set_variable(1, Some(1.)), Err(ErrType::InvalidVariableAccess(1)));

    interp.run_program(load("#100=5\n#1=3\n#2=#500")).unwrap();
    assert_eq!(interp.get_variable(2), Ok(Some(7.)));

    interp.run_program(load("#2=#100\n#3=#1")).unwrap();
    assert_eq!(interp.get_variable(2), Ok(Some(5.)));
    assert_eq!(interp.get_variable(3), Ok(None));

    assert_eq!(interp.set_variable(0, Some(1.)), Err(ErrType::InvalidVariableAccess(0)));
    assert_eq!(interp.get_variable(0), Ok(None));
    assert_eq!(interp.get_variable(300), Err(ErrType::InvalidVariableAccess(300)));

    interp.commons_mut().clear();
    assert_eq!(interp.get_variable(100), Ok(None));
}
