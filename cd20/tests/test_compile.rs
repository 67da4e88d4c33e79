use cd20::{
    ast::NodeKind,
    codegen::{Generator, Operation},
    prelude::*,
    scan::Lexer,
};

fn parse(source: &str) -> (Option<cd20::ast::Node>, SymbolTableManager, Vec<Annotation>) {
    let mut symbols = SymbolTableManager::new();
    let mut annotations = Vec::new();
    let root = Parser::new(Lexer::new(source), &mut symbols, &mut annotations).parse();
    (root, symbols, annotations)
}

/// Counts at the head of each section match the lines that follow.
fn assert_module_shape(module: &str) {
    let mut lines = module.lines();
    let mut sections = 0;
    while let Some(count) = lines.next() {
        let count: usize = count.trim().parse().expect("section count");
        for _ in 0..count {
            assert!(lines.next().is_some(), "section {} is short", sections);
        }
        sections += 1;
    }
    assert_eq!(sections, 4);
}

#[test]
fn test_compile_minimal() {
    let compiled = compile_str(include_str!("fixtures/minimal.cd"), &CompileConf::default()).unwrap();

    assert_eq!(
        compiled.module,
        "1\n  90  00  00  00  08  63  65  00\n0\n0\n1\n 104 105  00  00  00  00  00  00"
    );

    // Missing semicolon after the print list.
    assert_eq!(compiled.annotations.len(), 1);
    assert_eq!(compiled.annotations[0].severity, Severity::Warning);
}

#[test]
fn test_if_else_patching() {
    let (root, mut symbols, annotations) = parse(include_str!("fixtures/if_else.cd"));
    assert!(annotations.is_empty(), "{:?}", annotations);
    let code = Generator::new(&mut symbols).generate(&root.unwrap()).unwrap();

    let listing: Vec<_> = code.instructions().collect();
    let jumps: Vec<_> = listing
        .iter()
        .filter(|(_, instr)| instr.op() == Operation::La0)
        .collect();
    assert_eq!(jumps.len(), 2);

    // Else branch begins after the BR that ends the then branch.
    let br = listing
        .iter()
        .position(|(_, instr)| instr.op() == Operation::Br)
        .unwrap();
    let else_start = listing[br + 1].0;
    assert_eq!(jumps[0].1.operands(), &(else_start as i32).to_be_bytes());
    assert_eq!(else_start, 20);

    // End target is the HALT right after the else branch.
    let (halt, _) = listing.last().unwrap();
    assert_eq!(jumps[1].1.operands(), &(*halt as i32).to_be_bytes());
    assert_eq!(*halt, 27);
}

#[test]
fn test_compile_full_program() {
    let compiled = compile_str(include_str!("fixtures/sums.cd"), &CompileConf::default()).unwrap();
    assert!(compiled.annotations.is_empty(), "{:?}", compiled.annotations);
    assert_module_shape(&compiled.module);

    let sections: Vec<&str> = compiled.module.lines().collect();
    let code_lines: usize = sections[0].parse().unwrap();

    // Integers: 10, 0, 1. Reals: 2.5, 10.0, 0.0.
    let ints = code_lines + 1;
    assert_eq!(&sections[ints..ints + 4], &["3", "10", "0", "1"]);
    let reals = ints + 4;
    assert_eq!(&sections[reals..reals + 4], &["3", "2.5", "10.0", "0.0"]);
}

#[test]
fn test_backfill_is_deterministic() {
    let source = include_str!("fixtures/sums.cd");
    let first = compile_str(source, &CompileConf::default()).unwrap();
    let second = compile_str(source, &CompileConf::default()).unwrap();
    assert_eq!(first.module, second.module);
}

#[test]
fn test_duplicate_identifier() {
    let result = compile_str(
        "CD20 t constants x = 1, x = 2 main begin end CD20 t",
        &CompileConf::default(),
    );

    match result {
        Err(Cd20Error::Compile(annotations)) => {
            let errors: Vec<_> = annotations.iter().filter(|a| a.is_error()).collect();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("duplicate identifier"));
            assert_eq!((errors[0].line, errors[0].column), (1, 25));
        }
        other => panic!("expected compile error, found {:?}", other),
    }
}

#[test]
fn test_type_mismatch_points_at_value() {
    let source = "CD20 t main r : real begin r = true; end CD20 t";
    let (root, _, annotations) = parse(source);
    assert!(root.is_none());

    let error = annotations.iter().find(|a| a.is_error()).unwrap();
    assert!(error.message.contains("cannot assign"), "{}", error.message);
    assert_eq!((error.line, error.column), (1, 32));
    assert_eq!(error.length, 4);
}

#[test]
fn test_assign_to_constant() {
    let source = "CD20 t constants x = 1 main begin x = 2; end CD20 t";
    match compile_str(source, &CompileConf::default()) {
        Err(Cd20Error::Compile(annotations)) => {
            let error = annotations.last().unwrap();
            assert!(error.is_error());
            assert!(error.message.contains("constant 'x'"), "{}", error.message);
        }
        other => panic!("expected compile error, found {:?}", other),
    }
}

#[test]
fn test_undefined_identifier() {
    let (root, _, annotations) = parse("CD20 t main begin y = 2; end CD20 t");
    assert!(root.is_none());
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].message, "undefined identifier 'y'");
}

#[test]
fn test_program_name_mismatch() {
    let (root, _, annotations) = parse("CD20 first main begin return; end CD20 second");
    assert!(root.is_none());
    assert!(annotations[0].message.contains("'second'"));
}

#[test]
fn test_syntax_error() {
    let (root, _, annotations) = parse("CD20 t main begin println 1; CD20 t");
    assert!(root.is_none());
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].message, "expected a statement, found 'CD20'");
}

#[test]
fn test_soft_warnings() {
    let (root, _, annotations) = parse("CD20 t main begin end CD20 t trailing");
    assert!(root.is_some());

    let warnings: Vec<_> = annotations.iter().filter(|a| a.is_warning()).collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].message.contains("at least one statement"));
    assert!(warnings[1].message.contains("after end of program"));
}

#[test]
fn test_negated_identifier_warns() {
    let (root, _, annotations) = parse("CD20 t main a : int begin a = -a; end CD20 t");
    assert!(root.is_some());
    assert_eq!(annotations.len(), 1);
    assert!(annotations[0].is_warning());
    assert!(annotations[0].message.contains("cannot negate"));
}

#[test]
fn test_literals_are_interned() {
    let (root, symbols, _) = parse("CD20 t main a : int begin a = 5; a = 5 + -5; a = 5; end CD20 t");
    let root = root.unwrap();

    let five = symbols.resolve_constant("5").unwrap();
    let minus_five = symbols.resolve_constant("-5").unwrap();
    assert_ne!(five, minus_five);
    assert_eq!(symbols.constants().count(), 2);

    let main = root.right().unwrap();
    let statements = main.right().unwrap().items(NodeKind::Statements);
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0].right().unwrap().symbol, Some(five));
    assert_eq!(statements[2].right().unwrap().symbol, Some(five));
}

#[test]
fn test_scopes_and_shadowing() {
    let source = "CD20 t \
                  constants n = 1 \
                  func f(n : int) : int begin return n; end \
                  main begin println f(n); end CD20 t";
    let (root, mut symbols, annotations) = parse(source);
    assert!(root.is_some(), "{:?}", annotations);

    symbols.enter_scope("global").unwrap();
    let global_n = symbols.resolve("n").unwrap();
    symbols.enter_scope("__function__f").unwrap();
    let param_n = symbols.resolve("n").unwrap();
    assert_ne!(global_n, param_n);
    assert!(symbols.symbol(param_n).is_parameter());
    assert_eq!(symbols.symbol(param_n).storage().unwrap().offset, -8);

    symbols.leave_scope();
    assert_eq!(symbols.resolve("n"), Some(global_n));
}

#[test]
fn test_call_arity() {
    let (root, _, annotations) = parse(
        "CD20 t func f(a : int) : void begin return; end main begin f(1, 2); end CD20 t",
    );
    assert!(root.is_none());
    assert!(annotations[0].message.contains("takes 1 argument(s) but 2 were given"));
}

#[test]
fn test_listing_of_failure() {
    let source = "CD20 t\nmain begin\n  y = 2;\nend CD20 t\n";
    let annotations = match compile_str(source, &CompileConf::default()) {
        Err(Cd20Error::Compile(annotations)) => annotations,
        other => panic!("expected compile error, found {:?}", other),
    };

    let listing = Listing::new(source, &annotations).to_string();
    assert_eq!(
        listing,
        "1 | CD20 t\n\
         2 | main begin\n\
         3 |   y = 2;\n\
         \x20     ^\n\
         \x20     Error: undefined identifier 'y' (3:3)\n\
         4 | end CD20 t\n"
    );
}

/// Parses a program that must fail with exactly one error, and returns it.
fn single_error(source: &str) -> Annotation {
    let (root, _, annotations) = parse(source);
    assert!(root.is_none(), "{} should not parse", source);

    let errors: Vec<&Annotation> = annotations.iter().filter(|a| a.is_error()).collect();
    assert_eq!(errors.len(), 1, "{:?}", annotations);
    errors[0].clone()
}

fn assert_error(source: &str, message: &str, column: u32) {
    let error = single_error(source);
    assert_eq!(error.message, message);
    assert_eq!((error.line, error.column), (1, column));
}

#[test]
fn test_arithmetic_needs_numbers() {
    assert_error(
        "CD20 t main a : int begin a = true + 1; end CD20 t",
        "expected a numeric operand, found bool",
        31,
    );
}

#[test]
fn test_logical_needs_booleans() {
    assert_error(
        "CD20 t main b : bool begin b = 1 and true; end CD20 t",
        "expected a bool operand, found int",
        32,
    );
}

#[test]
fn test_conditions_must_be_boolean() {
    assert_error(
        "CD20 t main begin if (1) println 1; end end CD20 t",
        "condition must be bool, found int",
        23,
    );
    assert_error(
        "CD20 t main i : int begin for (; i) println i; end end CD20 t",
        "condition must be bool, found int",
        34,
    );
    assert_error(
        "CD20 t main begin repeat () println 1; until 2; end CD20 t",
        "condition must be bool, found int",
        46,
    );
}

#[test]
fn test_ordering_needs_numbers() {
    assert_error(
        "CD20 t main b : bool begin b = true < false; end CD20 t",
        "cannot compare bool with bool",
        37,
    );
    assert_error(
        "CD20 t main a : int, b : bool begin b = a > true; end CD20 t",
        "cannot compare int with bool",
        43,
    );
}

#[test]
fn test_compound_assignment_on_bool() {
    assert_error(
        "CD20 t main b : bool begin b += true; end CD20 t",
        "compound assignment needs numeric operands, found bool and bool",
        30,
    );
}

#[test]
fn test_input_targets() {
    assert_error(
        "CD20 t constants k = 1 main begin input k; end CD20 t",
        "cannot input into constant 'k'",
        41,
    );
    assert_error(
        "CD20 t main b : bool begin input b; end CD20 t",
        "input target 'b' must be int or real",
        34,
    );
}

#[test]
fn test_return_checks() {
    assert_error(
        "CD20 t main begin return 1; end CD20 t",
        "main can't return a value",
        26,
    );
    assert_error(
        "CD20 t func f() : void begin return 1; end main begin f(); end CD20 t",
        "void function 'f' can't return a value",
        37,
    );
    assert_error(
        "CD20 t func f() : int begin return; end main begin println f(); end CD20 t",
        "function 'f' must return a value of type int",
        29,
    );
    assert_error(
        "CD20 t func f() : int begin return true; end main begin println f(); end CD20 t",
        "cannot return bool from function 'f' returning int",
        36,
    );
}

#[test]
fn test_array_element_access_is_rejected() {
    assert_error(
        "CD20 t types p is x : int end ps is array [2] of p arrays a : ps main begin a[1] = 1; end CD20 t",
        "array element access is not supported",
        77,
    );
}

#[test]
fn test_user_type_in_declaration() {
    assert_error(
        "CD20 t types p is x : int end main q : p begin return; end CD20 t",
        "user defined type 'p' can't be used here",
        40,
    );
}

fn nested(depth: usize) -> String {
    format!(
        "CD20 t main a : int begin a = {}1{}; end CD20 t",
        "(".repeat(depth),
        ")".repeat(depth)
    )
}

#[test]
fn test_nesting_limit() {
    let (root, _, annotations) = parse(&nested(64));
    assert!(root.is_some(), "{:?}", annotations);

    // First parenthesis sits at column 31.
    let error = single_error(&nested(200));
    assert_eq!(error.message, "expression nested more than 64 levels deep");
    assert_eq!((error.line, error.column), (1, 31 + 64));
}
