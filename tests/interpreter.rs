mod common;

#[cfg(test)]
mod interpreter_tests {
    use rox as lox;

    use lox::session::{EXIT_DATA_ERROR, EXIT_SOFTWARE};
    use lox::value::Value;

    use crate::common::{capture_session, run_source};

    fn output_of(source: &str) -> String {
        let (out, err, code) = run_source(source);

        assert_eq!(err, "", "unexpected diagnostics for {:?}", source);
        assert_eq!(code, 0);

        out
    }

    fn runtime_error_of(source: &str) -> String {
        let (_, err, code) = run_source(source);

        assert_eq!(code, EXIT_SOFTWARE, "diagnostics: {}", err);

        err
    }

    // ── arithmetic and printing ─────────────────────────────────────────

    #[test]
    fn prints_integral_numbers_without_fraction() {
        assert_eq!(output_of("print 1 + 2;"), "3\n");
        assert_eq!(output_of("print 45.67;"), "45.67\n");
        assert_eq!(output_of("print 10 / 4;"), "2.5\n");
    }

    #[test]
    fn negative_zero_and_infinities() {
        assert_eq!(output_of("print -0;"), "-0\n");
        assert_eq!(output_of("print 1 / 0;"), "Infinity\n");
        assert_eq!(output_of("print -1 / 0;"), "-Infinity\n");
        assert_eq!(output_of("print 0 / 0;"), "NaN\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn comparison_and_equality() {
        let source = r#"
            print 1 < 2;
            print 2 <= 1;
            print nil == nil;
            print 1 == "1";
            print "a" == "a";
            print nil != false;
        "#;

        assert_eq!(output_of(source), "true\nfalse\ntrue\nfalse\ntrue\ntrue\n");
    }

    #[test]
    fn truthiness_only_nil_and_false_are_falsey() {
        assert_eq!(
            output_of("print !nil; print !false; print !0; print !\"\";"),
            "true\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(
            output_of("print nil or \"yes\"; print false and 1; print 1 and 2;"),
            "yes\nfalse\n2\n"
        );
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(
            output_of("var a = 0; true or (a = 1); false and (a = 2); print a;"),
            "0\n"
        );
    }

    // ── comma and ternary ───────────────────────────────────────────────

    #[test]
    fn comma_yields_right_operand() {
        assert_eq!(output_of("print (1, 2);"), "2\n");
        assert_eq!(output_of("var a = 1; a = 2, a = 3; print a;"), "3\n");
    }

    #[test]
    fn ternary_picks_branch_by_truthiness() {
        assert_eq!(output_of("print nil ? 1 : 2;"), "2\n");
        assert_eq!(output_of("print 0 ? 1 : 2;"), "1\n");
        assert_eq!(output_of("print false ? 1 : true ? 2 : 3;"), "2\n");
    }

    #[test]
    fn ternary_evaluates_only_chosen_branch() {
        assert_eq!(
            output_of("var a = 0; true ? 1 : (a = 5); false ? (a = 6) : 1; print a;"),
            "0\n"
        );
    }

    // ── variables, scopes and control flow ──────────────────────────────

    #[test]
    fn block_scopes_shadow_and_restore() {
        let source = r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;

        assert_eq!(output_of(source), "inner\nouter\n");
    }

    #[test]
    fn assignment_reaches_enclosing_scope() {
        assert_eq!(output_of("var a = 1; { a = 2; } print a;"), "2\n");
    }

    #[test]
    fn uninitialized_variable_is_nil() {
        assert_eq!(output_of("var a; print a;"), "nil\n");
    }

    #[test]
    fn loops() {
        let source = r#"
            var sum = 0;
            for (var i = 1; i <= 4; i = i + 1) sum = sum + i;
            print sum;

            var n = 3;
            while (n > 0) { print n; n = n - 1; }
        "#;

        assert_eq!(output_of(source), "10\n3\n2\n1\n");
    }

    #[test]
    fn if_else() {
        assert_eq!(
            output_of("if (1 > 2) print \"a\"; else print \"b\"; if (nil) print \"c\";"),
            "b\n"
        );
    }

    // ── functions and closures ──────────────────────────────────────────

    #[test]
    fn recursion() {
        let source = r#"
            fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn return_from_inside_loop() {
        let source = r#"
            fun first_over(limit) {
                for (var i = 0; ; i = i + 1) {
                    if (i * i > limit) return i;
                }
            }
            print first_over(50);
        "#;

        assert_eq!(output_of(source), "8\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn closures_keep_their_environment() {
        let source = r#"
            fun make_counter() {
                var count = 0;
                fun inc() { count = count + 1; return count; }
                return inc;
            }
            var a = make_counter();
            var b = make_counter();
            print a();
            print a();
            print b();
        "#;

        assert_eq!(output_of(source), "1\n2\n1\n");
    }

    #[test]
    fn closures_share_captured_variables() {
        let source = r#"
            var get;
            var set;
            {
                var x = "before";
                fun g() { return x; }
                fun s(v) { x = v; }
                get = g;
                set = s;
            }
            set("after");
            print get();
        "#;

        assert_eq!(output_of(source), "after\n");
    }

    #[test]
    fn callables_print_their_kind() {
        assert_eq!(
            output_of("fun add(a, b) { return a + b; } print add; print clock;"),
            "<fn add>\n<native fn>\n"
        );
    }

    #[test]
    fn clock_returns_seconds() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn classes_and_instances_print_by_name() {
        assert_eq!(
            output_of("class Bagel {} print Bagel; print Bagel();"),
            "Bagel\nBagel instance\n"
        );
    }

    #[test]
    fn fields_and_methods() {
        let source = r#"
            class Point {
                init(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }
            var p = Point(1, 2);
            p.x = 10;
            print p.sum();
            p.z = "new";
            print p.z;
        "#;

        assert_eq!(output_of(source), "12\nnew\n");
    }

    #[test]
    fn extracted_method_stays_bound() {
        let source = r#"
            class Greeter {
                init(name) { this.name = name; }
                greet() { print "hi " + this.name; }
            }
            var g = Greeter("bob").greet;
            g();
        "#;

        assert_eq!(output_of(source), "hi bob\n");
    }

    #[test]
    fn init_returns_the_instance() {
        let source = r#"
            class Foo {
                init() { this.n = 1; return; }
            }
            var foo = Foo();
            print foo.init();
            print foo.init() == foo;
        "#;

        assert_eq!(output_of(source), "Foo instance\ntrue\n");
    }

    #[test]
    fn inheritance_and_super() {
        let source = r#"
            class A {
                method() { return "A method"; }
                shared() { return "A shared"; }
            }
            class B < A {
                method() { return "B then " + super.method(); }
            }
            class C < B {}
            var c = C();
            print c.method();
            print c.shared();
        "#;

        assert_eq!(output_of(source), "B then A method\nA shared\n");
    }

    #[test]
    fn inherited_initializer_sets_arity() {
        let source = r#"
            class Base { init(v) { this.v = v; } }
            class Derived < Base {}
            print Derived(7).v;
        "#;

        assert_eq!(output_of(source), "7\n");
    }

    // ── runtime errors ──────────────────────────────────────────────────

    #[test]
    fn operand_type_errors() {
        assert_eq!(
            runtime_error_of("print -\"a\";"),
            "[line 1] Error: Operand of '-' must be a number.\n"
        );
        assert_eq!(
            runtime_error_of("print \"a\" + 1;"),
            "[line 1] Error: Operands of '+' must be two numbers or two strings.\n"
        );
        assert_eq!(
            runtime_error_of("\n\nprint 1 < \"b\";"),
            "[line 3] Error: Operands of '<' must be numbers.\n"
        );
    }

    #[test]
    fn string_operands_outside_concatenation() {
        assert_eq!(
            runtime_error_of("print 1 + \"hello\";"),
            "[line 1] Error: Operands of '+' must be two numbers or two strings.\n"
        );
        assert_eq!(
            runtime_error_of("print \"hello\" - \"world\";"),
            "[line 1] Error: Operands of '-' must be numbers.\n"
        );
        assert_eq!(
            runtime_error_of("print \"hello\" > \"world\";"),
            "[line 1] Error: Operands of '>' must be numbers.\n"
        );
    }

    #[test]
    fn undefined_variable() {
        assert_eq!(
            runtime_error_of("print nope;"),
            "[line 1] Error: Undefined variable 'nope'.\n"
        );
        assert_eq!(
            runtime_error_of("nope = 1;"),
            "[line 1] Error: Undefined variable 'nope'.\n"
        );
    }

    #[test]
    fn call_errors() {
        assert_eq!(
            runtime_error_of("\"str\"();"),
            "[line 1] Error: Can only call functions and classes.\n"
        );
        assert_eq!(
            runtime_error_of("fun f(a, b) {} f(1);"),
            "[line 1] Error: Expected 2 arguments but got 1.\n"
        );
        assert_eq!(
            runtime_error_of("class A {} A(1);"),
            "[line 1] Error: Expected 0 arguments but got 1.\n"
        );
    }

    #[test]
    fn property_errors() {
        assert_eq!(
            runtime_error_of("class A {} print A().missing;"),
            "[line 1] Error: Undefined property 'missing'.\n"
        );
        assert_eq!(
            runtime_error_of("var x = 1; print x.y;"),
            "[line 1] Error: Only instances have properties.\n"
        );
        assert_eq!(
            runtime_error_of("var x = 1; x.y = 2;"),
            "[line 1] Error: Only instances have fields.\n"
        );
    }

    #[test]
    fn superclass_must_be_a_class() {
        assert_eq!(
            runtime_error_of("var NotClass = 1; class A < NotClass {}"),
            "[line 1] Error: Superclass must be a class.\n"
        );
    }

    #[test]
    fn runtime_error_stops_the_unit_but_keeps_earlier_output() {
        let (out, err, code) = run_source("print 1;\nprint missing;\nprint 2;");

        assert_eq!(out, "1\n");
        assert_eq!(err, "[line 2] Error: Undefined variable 'missing'.\n");
        assert_eq!(code, EXIT_SOFTWARE);
    }

    /// Runs `source` on a thread with room for the full call-depth limit.
    fn run_deep(source: &'static str) -> (String, String, i32) {
        std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(move || run_source(source))
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn unbounded_recursion_is_a_runtime_error() {
        let (out, err, code) = run_deep("fun f() { f(); }\nf();");

        assert_eq!(out, "");
        assert_eq!(err, "[line 1] Error: Stack overflow.\n");
        assert_eq!(code, EXIT_SOFTWARE);
    }

    #[test]
    fn deep_recursion_below_the_limit_completes() {
        let (out, err, code) = run_deep(
            "fun count(n) { if (n > 0) return count(n - 1); return n; }\nprint count(1000);",
        );

        assert_eq!(err, "");
        assert_eq!(out, "0\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn session_recovers_after_stack_overflow() {
        let (out, err) = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let (mut session, out, err) = capture_session();

                session.run("fun f(n) { return f(n + 1); }\nf(0);");
                session.reset();
                session.run("fun g(n) { if (n > 0) return g(n - 1); return n; }\nprint g(10);");

                (out.contents(), err.contents())
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(out, "0\n");
        assert_eq!(err, "[line 1] Error: Stack overflow.\n");
    }

    // ── static errors stop execution ────────────────────────────────────

    #[test]
    fn lexical_error_prevents_execution() {
        let (out, err, code) = run_source("print 1; @");

        assert_eq!(out, "");
        assert_eq!(err, "[line 1] Error: Unexpected character.\n");
        assert_eq!(code, EXIT_DATA_ERROR);
    }

    #[test]
    fn syntax_error_prevents_execution() {
        let (out, err, code) = run_source("print 1;\nprint 2");

        assert_eq!(out, "");
        assert_eq!(err, "[line 2] Error at end: Expected ';' after value.\n");
        assert_eq!(code, EXIT_DATA_ERROR);
    }

    #[test]
    fn resolver_error_prevents_execution() {
        let (out, err, code) = run_source("print 1; return 2;");

        assert_eq!(out, "");
        assert_eq!(
            err,
            "[line 1] Error at 'return': Can't return from top-level code.\n"
        );
        assert_eq!(code, EXIT_DATA_ERROR);
    }

    // ── session behaviour ───────────────────────────────────────────────

    #[test]
    fn globals_persist_across_units_and_flags_reset() {
        let (mut session, out, err) = capture_session();

        assert!(session.run("var a = 1; fun inc() { a = a + 1; }"));
        session.reset();

        assert!(!session.run("print undefined_name;"));
        assert!(session.had_runtime_error());
        session.reset();

        assert!(!session.had_runtime_error());
        assert_eq!(session.exit_code(), 0);

        assert!(session.run("inc(); print a;"));
        assert_eq!(out.contents(), "2\n");
        assert_eq!(err.contents(), "[line 1] Error: Undefined variable 'undefined_name'.\n");
    }

    #[test]
    fn unit_after_error_inside_block_runs_in_global_scope() {
        let (mut session, out, _) = capture_session();

        assert!(!session.run("var g = \"global\"; { var g = \"local\"; print nope; }"));
        session.reset();

        assert!(session.run("print g;"));
        assert_eq!(out.contents(), "global\n");
    }

    #[test]
    fn evaluates_a_single_expression() {
        let (mut session, _, _) = capture_session();

        let tokens = session.scan("(1 + 2) * 3 == 9 ? \"yes\" : \"no\"");
        let expr = session.parse_expression(tokens).unwrap();

        assert_eq!(session.evaluate(&expr), Some(Value::from("yes")));
        assert!(!session.had_error());
    }

    #[test]
    fn evaluate_reports_runtime_errors() {
        let (mut session, _, err) = capture_session();

        let tokens = session.scan("1 - nil");
        let expr = session.parse_expression(tokens).unwrap();

        assert_eq!(session.evaluate(&expr), None);
        assert_eq!(session.exit_code(), EXIT_SOFTWARE);
        assert_eq!(err.contents(), "[line 1] Error: Operands of '-' must be numbers.\n");
    }

    struct BrokenSink;

    impl std::io::Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn unwritable_diagnostics_still_set_exit_code() {
        let mut session = lox::Session::with_output(Box::new(BrokenSink), Box::new(BrokenSink));

        assert!(!session.run("print ;"));
        assert_eq!(session.exit_code(), EXIT_DATA_ERROR);

        session.reset();

        assert!(!session.run("print -nil;"));
        assert_eq!(session.exit_code(), EXIT_SOFTWARE);
    }
}
