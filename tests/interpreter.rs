mod common;

use common::{run, run_ok, runtime_message, session};
use pretty_assertions::assert_eq;
use rox::value::Value;

#[test]
fn arithmetic_and_printing() {
    assert_eq!(
        run_ok("print 1 + 2 * 3; print (1 + 2) * 3; print 7 / 2; print -4 - -4; print 10 / 4 * 2;"),
        vec!["7", "9", "3.5", "0", "5"]
    );
}

#[test]
fn string_concatenation_and_equality() {
    assert_eq!(
        run_ok(
            "print \"foo\" + \"bar\";
             print \"a\" == \"a\";
             print nil == nil;
             print nil == false;
             print 1 == 1.0;
             print 0 != nil;"
        ),
        vec!["foobar", "true", "true", "false", "true", "true"]
    );
}

#[test]
fn truthiness_only_nil_and_false_are_falsy() {
    assert_eq!(
        run_ok(
            "if (0) print \"zero\";
             if (\"\") print \"empty\";
             if (nil) print \"nil\"; else print \"no nil\";
             print !false;
             print !!nil;"
        ),
        vec!["zero", "empty", "no nil", "true", "false"]
    );
}

#[test]
fn logical_operators_short_circuit_and_return_operand() {
    assert_eq!(
        run_ok(
            "print nil or \"default\";
             print 1 and 2;
             print false and undefined_name;
             print \"yes\" or undefined_name;"
        ),
        vec!["default", "2", "false", "yes"]
    );
}

#[test]
fn operands_evaluate_left_to_right() {
    assert_eq!(
        run_ok(
            "var log = \"\";
             fun t(name, value) { log = log + name; return value; }
             print t(\"a\", 1) - t(\"b\", 2) * t(\"c\", 3);
             print log;"
        ),
        vec!["-5", "abc"]
    );
}

#[test]
fn variables_and_block_scopes() {
    assert_eq!(
        run_ok(
            "var a = \"outer\";
             {
               var a = \"inner\";
               print a;
             }
             print a;
             var b;
             print b;
             b = a = \"both\";
             print b;"
        ),
        vec!["inner", "outer", "nil", "both"]
    );
}

#[test]
fn closure_keeps_captured_locals() {
    assert_eq!(
        run_ok(
            "fun make() {
               var x = 0;
               fun inc() { x = x + 1; return x; }
               return inc;
             }
             var f = make();
             print f();
             print f();
             var g = make();
             print g();"
        ),
        vec!["1", "2", "1"]
    );
}

#[test]
fn closures_share_one_environment() {
    assert_eq!(
        run_ok(
            "var get; var set;
             fun pair() {
               var v = \"initial\";
               fun g() { return v; }
               fun s(n) { v = n; }
               get = g; set = s;
             }
             pair();
             set(\"updated\");
             print get();"
        ),
        vec!["updated"]
    );
}

#[test]
fn recursion() {
    assert_eq!(
        run_ok(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
             print fib(15);"
        ),
        vec!["610"]
    );
}

#[test]
fn lambdas_are_values() {
    assert_eq!(
        run_ok(
            "fun apply(f, x) { return f(x); }
             print apply(fun (n) { return n * n; }, 7);
             var id = fun (v) { return v; };
             print id;"
        ),
        vec!["49", "<fn>"]
    );
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(
        run_ok("fun f() { } print f(); fun g() { return; } print g(); print f;"),
        vec!["nil", "nil", "<fn f>"]
    );
}

#[test]
fn while_and_for_loops() {
    assert_eq!(
        run_ok(
            "var i = 0; while (i < 3) { print i; i = i + 1; }
             for (var j = 10; j > 7; j = j - 1) print j;"
        ),
        vec!["0", "1", "2", "10", "9", "8"]
    );
}

#[test]
fn break_leaves_only_the_innermost_loop() {
    assert_eq!(
        run_ok(
            "for (var i = 0; i < 3; i = i + 1) {
               for (var j = 0; j < 10; j = j + 1) {
                 if (j == 2) break;
                 print i * 10 + j;
               }
             }"
        ),
        vec!["0", "1", "10", "11", "20", "21"]
    );
}

#[test]
fn return_from_inside_loop() {
    assert_eq!(
        run_ok(
            "fun find() { var i = 0; while (true) { if (i == 4) return i; i = i + 1; } }
             print find();"
        ),
        vec!["4"]
    );
}

#[test]
fn classes_fields_and_methods() {
    assert_eq!(
        run_ok(
            "class Counter {
               init(start) { this.count = start; }
               inc() { this.count = this.count + 1; return this; }
             }
             var c = Counter(5);
             c.inc().inc();
             print c.count;
             print c;
             print Counter;
             c.extra = \"field\";
             print c.extra;"
        ),
        vec!["7", "Counter instance", "Counter", "field"]
    );
}

#[test]
fn initializer_always_returns_this() {
    assert_eq!(
        run_ok(
            "class P { init() { this.v = 1; return; } }
             var p = P();
             print p.v;
             var again = p.init();
             print again == p;"
        ),
        vec!["1", "true"]
    );
}

#[test]
fn bound_methods_remember_their_instance() {
    assert_eq!(
        run_ok(
            "class Person {
               init(name) { this.name = name; }
               greet() { print \"hi \" + this.name; }
             }
             var m = Person(\"ada\").greet;
             m();
             var p = Person(\"bob\");
             p.other = m;
             p.other();"
        ),
        vec!["hi ada", "hi ada"]
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        run_ok(
            "class A { m() { return \"method\"; } }
             var a = A();
             print a.m();
             a.m = fun () { return \"field\"; };
             print a.m();"
        ),
        vec!["method", "field"]
    );
}

#[test]
fn inheritance_and_super_bind_current_instance() {
    assert_eq!(
        run_ok(
            "class Base {
               init(tag) { this.tag = tag; }
               describe() { return \"base \" + this.tag; }
               plain() { return \"plain\"; }
             }
             class Derived < Base {
               init(tag) { super.init(tag + \"!\"); }
               describe() { return \"derived then \" + super.describe(); }
             }
             var d = Derived(\"x\");
             print d.describe();
             print d.plain();
             print Derived(\"y\").tag;"
        ),
        vec!["derived then base x!", "plain", "y!"]
    );
}

#[test]
fn super_walks_past_the_direct_superclass() {
    assert_eq!(
        run_ok(
            "class A { say() { return \"A\"; } }
             class B < A { }
             class C < B { say() { return \"C>\" + super.say(); } }
             print C().say();"
        ),
        vec!["C>A"]
    );
}

#[test]
fn class_arity_comes_from_inherited_init() {
    assert_eq!(
        run_ok(
            "class A { init(a, b) { this.sum = a + b; } }
             class B < A { }
             print B(2, 3).sum;"
        ),
        vec!["5"]
    );
}

#[test]
fn methods_may_reference_their_own_class() {
    assert_eq!(
        run_ok(
            "class Node { make() { return Node(); } }
             print Node().make();"
        ),
        vec!["Node instance"]
    );
}

#[test]
fn clock_is_a_zero_arity_native() {
    assert_eq!(
        run_ok("print clock() > 0; print clock;"),
        vec!["true", "<native fn clock>"]
    );
}

#[test]
fn single_expression_is_echoed() {
    assert_eq!(run_ok("1 + 2;"), vec!["3"]);
    assert_eq!(
        run_ok("fun f() { print \"inside\"; return 4; } f();"),
        vec!["inside"]
    );

    let (mut lox, out) = session();
    lox.run("fun f() { print \"inside\"; return 4; }");
    lox.run("f();");
    assert_eq!(out.lines(), vec!["inside", "4"]);
}

#[test]
fn session_keeps_definitions_between_inputs() {
    let (mut lox, out) = session();

    assert!(!lox.run("var count = 1;").had_error());
    assert!(!lox.run("class K { get() { return count; } }").had_error());
    assert!(!lox.run("count = count + 1;").had_runtime_error());
    lox.run("print K().get();");

    // An error in one input does not poison the next.
    assert!(lox.run("print missing;").had_runtime_error());
    assert!(lox.run("print (;").had_error());
    let reporter = lox.run("print count;");
    assert!(!reporter.had_error() && !reporter.had_runtime_error());

    assert_eq!(out.lines(), vec!["2", "2", "2"]);
}

#[test]
fn evaluate_expression_returns_value() {
    let (mut lox, _) = session();

    assert_eq!(lox.evaluate_expression("(1 + 2) * 4").ok(), Some(Value::Number(12.0)));
    assert_eq!(
        lox.evaluate_expression("\"a\" + \"b\"").ok(),
        Some(Value::String("ab".into()))
    );

    let reporter = lox.evaluate_expression("-\"x\"").err();
    assert!(reporter.is_some_and(|r| r.had_runtime_error()));
}

#[test]
fn custom_native_functions() {
    let (mut lox, out) = session();

    lox.interpreter_mut().define_native("double", 1, |args| match args {
        [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
        _ => Err("double expects a number.".to_string()),
    });

    lox.run("print double(21);");
    let reporter = lox.run("double(\"x\");");

    assert_eq!(out.lines(), vec!["42"]);
    assert_eq!(runtime_message(&reporter).as_deref(), Some("double expects a number."));
}

// ─────────────────────────────── runtime errors ───────────────────────────────

fn runtime_error(source: &str) -> (Vec<String>, String) {
    let (lines, reporter) = run(source);

    assert!(!reporter.had_error(), "static errors: {:?}", reporter.render(source));
    let message = runtime_message(&reporter).unwrap_or_else(|| panic!("no runtime error for {:?}", source));

    (lines, message)
}

#[test]
fn type_mismatches_stop_the_run() {
    assert_eq!(
        runtime_error("print \"before\"; print \"a\" - 1; print \"after\";"),
        (vec!["before".to_string()], "Operands must be numbers.".to_string())
    );
    assert_eq!(
        runtime_error("print 1 + true;").1,
        "Operands must be two numbers or two strings."
    );
    assert_eq!(runtime_error("nil();").1, "Can only call functions and classes.");
    assert_eq!(runtime_error("print -\"x\";").1, "Operand must be a number.");
    assert_eq!(runtime_error("print 1 < \"2\";").1, "Operands must be numbers.");
}

#[test]
fn undefined_names() {
    assert_eq!(runtime_error("print nope;").1, "Undefined variable 'nope'.");
    assert_eq!(runtime_error("nope = 1;").1, "Undefined variable 'nope'.");
    assert_eq!(
        runtime_error("class A {} print A().missing;").1,
        "Undefined property 'missing'."
    );
    assert_eq!(
        runtime_error("class A {} class B < A { f() { return super.g(); } } B().f();").1,
        "Undefined property 'g'."
    );
}

#[test]
fn arity_and_property_targets() {
    assert_eq!(
        runtime_error("fun f(a) {} f(1, 2);").1,
        "Expected 1 arguments but got 2."
    );
    assert_eq!(
        runtime_error("class A { init(x) {} } A();").1,
        "Expected 1 arguments but got 0."
    );
    assert_eq!(runtime_error("clock(1);").1, "Expected 0 arguments but got 1.");
    assert_eq!(runtime_error("print 4.x;").1, "Only instances have properties.");
    assert_eq!(runtime_error("var s = \"s\"; s.x = 1;").1, "Only instances have fields.");
}

#[test]
fn superclass_must_be_a_class() {
    assert_eq!(
        runtime_error("var NotClass = 1; class A < NotClass {}").1,
        "Superclass must be a class."
    );
}

#[test]
fn runtime_error_inside_block_does_not_leak_scope() {
    let (mut lox, out) = session();

    lox.run("var x = \"global\";");
    assert!(lox.run("{ var x = \"local\"; x(); }").had_runtime_error());
    lox.run("print x;");

    assert_eq!(out.lines(), vec!["global"]);
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(run_ok("print 1 / 0; print -1 / 0;"), vec!["inf", "-inf"]);
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    let (mut lox, out) = session();

    let reporter = lox.run("fun f(n) { return f(n + 1); } f(0);");
    assert_eq!(runtime_message(&reporter).as_deref(), Some("Stack overflow."));

    // The session survives and the call depth starts from zero again.
    lox.run("print 1;");
    lox.run("fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); }");
    lox.run("print count(1000);");

    assert_eq!(out.lines(), vec!["1", "1000"]);
}

#[test]
fn deeply_nested_expression_evaluates() {
    let depth = 400;
    let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

    assert_eq!(run_ok(&source), vec!["1"]);
}

#[test]
fn rejected_input_leaves_no_resolutions_behind() {
    let (mut lox, _) = session();

    lox.run("{ var a = 1; print a; }");
    let recorded = lox.interpreter_mut().resolution_count();

    let reporter = lox.run("{ var b = 1; var b = 2; print b; }");
    assert!(reporter.had_error());
    assert_eq!(lox.interpreter_mut().resolution_count(), recorded);

    assert!(lox.evaluate_expression("this").is_err());
    assert_eq!(lox.interpreter_mut().resolution_count(), recorded);
}
