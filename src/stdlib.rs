//! The fixed native-callable table (spec §4.5): every name the interpreter
//! falls back to when a call isn't a user-defined function.

use std::io::{self, Read, Write};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use log::{debug, warn};

use crate::error::{GalError, GalResult};
use crate::value::Value;

pub fn call(name: &str, args: &[Value], line: usize) -> GalResult<Value> {
    debug!("dispatching stdlib call '{name}' ({} arg(s))", args.len());
    match name {
        "std.print" => {
            print_args(args);
            Ok(Value::none())
        }
        "std.println" => {
            println_args(args);
            Ok(Value::none())
        }
        "std.exit" => exit(args),
        "std.len" => len(args, line),
        "std.len_indecies" => len_indecies(args, line),
        "std.split" => split(args, line),
        "std.join" => join(args, line),
        "std.read" => read(args, line),
        "std.write" => write_file(args, line),
        "std.exists" => exists(args, line),
        "std.shell" => shell(args, line),
        "std.inputln" => inputln(args, line),
        "std.input" => input(args, line),
        "std.binput" => binput(line),
        "std.char" => char_fn(args, line),
        "std.insert" => insert(args, line),
        "std.slice" => slice(args, line),
        "std.writable" => writable(args, line),
        "term.term_width" => Ok(Value::number(size().map(|(w, _)| w as f64).unwrap_or(0.0))),
        "term.term_height" => Ok(Value::number(size().map(|(_, h)| h as f64).unwrap_or(0.0))),
        _ => Err(GalError::name(format!("'{name}' is not defined"), Some(line))),
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter(line: usize) -> GalResult<Self> {
        enable_raw_mode().map_err(|e| GalError::io(e.to_string(), None)).map(|_| {
            debug!("line {line}: entered raw terminal mode");
            Self
        })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to restore terminal mode: {e}");
        }
    }
}

fn expect1(args: &[Value], line: usize) -> GalResult<&Value> {
    args.first().ok_or_else(|| GalError::arity("expected 1 argument", Some(line)))
}

fn expect2(args: &[Value], line: usize) -> GalResult<(&Value, &Value)> {
    if args.len() < 2 {
        return Err(GalError::arity("expected 2 arguments", Some(line)));
    }
    Ok((&args[0], &args[1]))
}

fn expect3(args: &[Value], line: usize) -> GalResult<(&Value, &Value, &Value)> {
    if args.len() < 3 {
        return Err(GalError::arity("expected 3 arguments", Some(line)));
    }
    Ok((&args[0], &args[1], &args[2]))
}

fn print_args(args: &[Value]) {
    let mut stdout = io::stdout();
    for a in args {
        let _ = write!(stdout, "{}", a.scalar);
    }
    let _ = stdout.flush();
}

fn println_args(args: &[Value]) {
    let mut stdout = io::stdout();
    for a in args {
        let _ = writeln!(stdout, "{}", a.scalar);
    }
}

fn exit(args: &[Value]) -> GalResult<Value> {
    if let Some(message) = args.first() {
        eprintln!("{}", message.scalar);
    }
    std::process::exit(1);
}

fn len(args: &[Value], line: usize) -> GalResult<Value> {
    let v = expect1(args, line)?;
    Ok(Value::number(v.scalar.as_bytes().len() as f64))
}

fn len_indecies(args: &[Value], line: usize) -> GalResult<Value> {
    let v = expect1(args, line)?;
    Ok(Value::number(v.indexed.len() as f64))
}

fn split(args: &[Value], line: usize) -> GalResult<Value> {
    let (s, sep) = expect2(args, line)?;
    let parts: Vec<&str> = if sep.scalar.is_empty() {
        s.scalar.split_terminator("").skip(1).collect()
    } else {
        s.scalar.split(sep.scalar.as_str()).collect()
    };
    let mut result = Value::number(parts.len() as f64);
    for (i, part) in parts.iter().enumerate() {
        result.indexed.insert(i.to_string(), Value::string(*part));
    }
    Ok(result)
}

fn join(args: &[Value], line: usize) -> GalResult<Value> {
    let (array, sep) = expect2(args, line)?;
    let mut entries: Vec<(usize, &Value)> = array
        .indexed
        .iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|n| (n, v)))
        .collect();
    entries.sort_by_key(|(n, _)| *n);
    let joined: Vec<&str> = entries.iter().map(|(_, v)| v.scalar.as_str()).collect();
    Ok(Value::string(joined.join(&sep.scalar)))
}

fn read(args: &[Value], line: usize) -> GalResult<Value> {
    let path = expect1(args, line)?;
    match std::fs::read_to_string(&path.scalar) {
        Ok(contents) => Ok(Value::string(contents)),
        Err(_) => Ok(Value::none()),
    }
}

fn write_file(args: &[Value], line: usize) -> GalResult<Value> {
    let (path, contents) = expect2(args, line)?;
    Ok(Value::boolean(std::fs::write(&path.scalar, &contents.scalar).is_ok()))
}

fn exists(args: &[Value], line: usize) -> GalResult<Value> {
    let path = expect1(args, line)?;
    Ok(Value::boolean(std::path::Path::new(&path.scalar).exists()))
}

fn shell(args: &[Value], line: usize) -> GalResult<Value> {
    let command = expect1(args, line)?;
    let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    match std::process::Command::new(shell).arg(flag).arg(&command.scalar).output() {
        Ok(output) if output.status.success() => {
            Ok(Value::string(String::from_utf8_lossy(&output.stdout).into_owned()))
        }
        Ok(output) => Ok(Value::string(String::from_utf8_lossy(&output.stderr).into_owned())),
        Err(e) => Ok(Value::string(e.to_string())),
    }
}

fn inputln(args: &[Value], line: usize) -> GalResult<Value> {
    let prompt = expect1(args, line)?;
    print!("{}", prompt.scalar);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).map_err(|e| GalError::io(e.to_string(), None))?;
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Value::string(buf))
}

fn input(args: &[Value], line: usize) -> GalResult<Value> {
    let (prompt, count) = expect2(args, line)?;
    print!("{}", prompt.scalar);
    io::stdout().flush().ok();
    let count = count.as_number(line)? as usize;
    let _guard = RawModeGuard::enter(line)?;
    let mut buf = vec![0u8; count];
    io::stdin().read_exact(&mut buf).map_err(|e| GalError::io(e.to_string(), None))?;
    Ok(Value::string(String::from_utf8_lossy(&buf).into_owned()))
}

fn binput(line: usize) -> GalResult<Value> {
    let _guard = RawModeGuard::enter(line)?;
    let mut buf = [0u8; 1];
    io::stdin().read_exact(&mut buf).map_err(|e| GalError::io(e.to_string(), None))?;
    Ok(Value::number(buf[0] as f64))
}

fn char_fn(args: &[Value], line: usize) -> GalResult<Value> {
    let v = expect1(args, line)?;
    let code = v.as_number(line)? as u32;
    let ch = char::from_u32(code)
        .ok_or_else(|| GalError::ty(format!("{code} is not a valid code point"), Some(line)))?;
    Ok(Value::string(ch.to_string()))
}

fn insert(args: &[Value], line: usize) -> GalResult<Value> {
    let (s, i, t) = expect3(args, line)?;
    let idx = (i.as_number(line)? as usize).min(s.scalar.len());
    let mut result = String::with_capacity(s.scalar.len() + t.scalar.len());
    result.push_str(&s.scalar[..idx]);
    result.push_str(&t.scalar);
    result.push_str(&s.scalar[idx..]);
    Ok(Value::string(result))
}

fn slice(args: &[Value], line: usize) -> GalResult<Value> {
    let (s, start, end) = expect3(args, line)?;
    let len = s.scalar.len();
    let start = (start.as_number(line)? as usize).min(len);
    let end = (end.as_number(line)? as usize).min(len).max(start);
    Ok(Value::string(s.scalar[start..end].to_string()))
}

fn writable(args: &[Value], line: usize) -> GalResult<Value> {
    let v = expect1(args, line)?;
    let code = v.as_number(line)? as i64;
    Ok(Value::boolean((0x20..=0x7e).contains(&code)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_bytes() {
        let result = call("std.len", &[Value::string("hello")], 1).unwrap();
        assert_eq!(result.scalar, "5");
    }

    #[test]
    fn split_then_join_round_trips() {
        let split_result = call("std.split", &[Value::string("a,b,c"), Value::string(",")], 1).unwrap();
        assert_eq!(split_result.indexed.len(), 3);
        let joined = call("std.join", &[split_result, Value::string("-")], 1).unwrap();
        assert_eq!(joined.scalar, "a-b-c");
    }

    #[test]
    fn insert_splices_at_index() {
        let result = call(
            "std.insert",
            &[Value::string("ac"), Value::number(1.0), Value::string("b")],
            1,
        )
        .unwrap();
        assert_eq!(result.scalar, "abc");
    }

    #[test]
    fn slice_extracts_a_range() {
        let result =
            call("std.slice", &[Value::string("hello"), Value::number(1.0), Value::number(3.0)], 1).unwrap();
        assert_eq!(result.scalar, "el");
    }

    #[test]
    fn writable_rejects_control_codes() {
        let yes = call("std.writable", &[Value::number(65.0)], 1).unwrap();
        assert_eq!(yes.scalar, "yay");
        let no = call("std.writable", &[Value::number(7.0)], 1).unwrap();
        assert_eq!(no.scalar, "nay");
    }

    #[test]
    fn unknown_name_is_a_name_error() {
        let err = call("std.nonexistent", &[], 1).unwrap_err();
        assert!(matches!(err, GalError::Name { .. }));
    }
}
