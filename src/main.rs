use strand::repl::Repl;
use strand::{ExecutionMirror, Executive, RenderMode, SetStatus, StrandError, Value, WatchSession};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut exec = Executive::new();

    // script mode: run the file, print the core dump, exit
    if let Some(path) = std::env::args().nth(1) {
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        };
        if let Err(e) = exec.run(&source) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        let mirror = ExecutionMirror::new(&mut exec);
        match mirror.get_core_dump() {
            Ok(dump) => println!("{}", dump),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    let mut repl = match Repl::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Cannot start REPL: {}", e);
            std::process::exit(1);
        }
    };
    let mut session = WatchSession::new();

    println!("Strand v0.1.0");
    println!("Statements end with ';'. Type a name to inspect it, :help for commands.");
    println!();

    loop {
        let line = match repl.read_line("> ") {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        repl.add_history(line);

        if line == ":exit" || line == "exit" {
            break;
        }
        if line == ":help" {
            print_help();
            continue;
        }

        if let Err(e) = dispatch(line, &mut exec, &mut session) {
            eprintln!("{}", e);
        }
    }

    repl.finalize();
    println!("Goodbye!");
}

fn print_help() {
    println!(":dump              core dump of every global");
    println!(":watch <name>      add a name to the watch list");
    println!(":unwatch <name>    drop a name from the watch list");
    println!(":watches           render every watched name");
    println!(":set <name> <val>  set a variable and re-execute dependents");
    println!(":exit              quit");
}

fn dispatch(
    line: &str,
    exec: &mut Executive,
    session: &mut WatchSession,
) -> Result<(), StrandError> {
    if line == ":dump" {
        let mirror = ExecutionMirror::new(exec);
        println!("{}", mirror.get_core_dump()?);
        return Ok(());
    }
    if let Some(name) = line.strip_prefix(":watch ") {
        let mirror = ExecutionMirror::new(exec);
        let text = mirror.watch(session, name.trim())?;
        println!("{} = {}", name.trim(), text);
        return Ok(());
    }
    if let Some(name) = line.strip_prefix(":unwatch ") {
        session.remove(name.trim());
        return Ok(());
    }
    if line == ":watches" {
        let mirror = ExecutionMirror::new(exec);
        for (name, text) in mirror.refresh(session) {
            println!("{} = {}", name, text);
        }
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix(":set ") {
        let mut parts = rest.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| StrandError::from(":set needs a name and a value"))?;
        let raw = parts
            .next()
            .ok_or_else(|| StrandError::from(":set needs a value"))?;
        let value = parse_scalar(raw)?;
        let mut mirror = ExecutionMirror::new(exec);
        match mirror.set_value_and_execute(name, value)? {
            SetStatus::Set => {
                let text = mirror.get_string_value(name, RenderMode::Watch)?;
                println!("{} = {}", name, text);
            }
            SetStatus::NotSet => println!("{} has no dependency tracking; not set", name),
        }
        return Ok(());
    }

    if line.contains('=') {
        // a statement (or several); execute and show nothing on success
        exec.run(line)?;
        return Ok(());
    }

    // bare name: inspect
    let mirror = ExecutionMirror::new(exec);
    let text = mirror.get_string_value(line, RenderMode::Watch)?;
    println!("{}", text);
    Ok(())
}

fn parse_scalar(raw: &str) -> Result<Value, StrandError> {
    match raw {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    if let Ok(d) = raw.parse::<f64>() {
        return Ok(Value::Double(d));
    }
    Err(StrandError::from(format!(
        "cannot parse '{}' as a scalar value",
        raw
    )))
}
