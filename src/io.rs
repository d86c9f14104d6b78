use std::fs;
use std::path::Path;

use crate::constants::Word;
use crate::error::{TraceError, VmError};
use crate::vm_manager::VmManager;

/// One operation from a trace file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Read(u64),
    Write(u64, Word),
}

/// Parse a trace: one operation per line, `r <address>` or
/// `w <address> <value>`. Blank lines and `#` comments are skipped.
pub fn parse_trace(content: &str) -> Result<Vec<TraceOp>, TraceError> {
    let mut ops = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let op = match tokens.as_slice() {
            ["r", address] => TraceOp::Read(parse_address(number, address)?),
            ["w", address, value] => {
                TraceOp::Write(parse_address(number, address)?, parse_value(number, value)?)
            }
            _ => {
                return Err(TraceError::Parse {
                    line: number,
                    message: format!("expected `r <address>` or `w <address> <value>`, got `{line}`"),
                })
            }
        };
        ops.push(op);
    }
    Ok(ops)
}

fn parse_address(line: usize, token: &str) -> Result<u64, TraceError> {
    token.parse().map_err(|_| TraceError::Parse {
        line,
        message: format!("invalid address: {token}"),
    })
}

fn parse_value(line: usize, token: &str) -> Result<Word, TraceError> {
    token.parse().map_err(|_| TraceError::Parse {
        line,
        message: format!("invalid value: {token}"),
    })
}

/// Read and parse a trace file
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceOp>, TraceError> {
    let content = fs::read_to_string(path.as_ref()).map_err(|source| TraceError::Read {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    parse_trace(&content)
}

/// Run `ops` in program order, collecting the value of every read
pub fn run_trace(vm: &mut VmManager, ops: &[TraceOp]) -> Result<Vec<Word>, VmError> {
    let mut results = Vec::new();
    for &op in ops {
        match op {
            TraceOp::Read(address) => results.push(vm.read(address)?),
            TraceOp::Write(address, value) => vm.write(address, value)?,
        }
    }
    Ok(results)
}

/// Write the collected read results to an output file, space separated
pub fn write_results<P: AsRef<Path>>(path: P, results: &[Word]) -> Result<(), TraceError> {
    let output: Vec<String> = results.iter().map(|r| r.to_string()).collect();
    fs::write(path.as_ref(), output.join(" ")).map_err(|source| TraceError::Write {
        path: path.as_ref().to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::MemoryLayout;

    fn tiny_vm() -> VmManager {
        VmManager::new(MemoryLayout::new(1, 5, 5, 4))
    }

    #[test]
    fn test_parse_simple_trace() {
        let ops = parse_trace("w 13 3\nr 13\n").unwrap();
        assert_eq!(ops, vec![TraceOp::Write(13, 3), TraceOp::Read(13)]);
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let ops = parse_trace("# warm-up\n\nw 0 -5\n   \nr 0\n").unwrap();
        assert_eq!(ops, vec![TraceOp::Write(0, -5), TraceOp::Read(0)]);
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        let err = parse_trace("w 1 2\nx 3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let err = parse_trace("r abc\n").unwrap_err();
        assert!(err.to_string().contains("invalid address"));
    }

    #[test]
    fn test_parse_rejects_missing_value() {
        assert!(parse_trace("w 5\n").is_err());
    }

    #[test]
    fn test_run_trace_collects_reads() {
        let mut vm = tiny_vm();
        let ops = parse_trace("w 13 3\nw 0 9\nr 13\nr 0\nr 1\n").unwrap();
        let results = run_trace(&mut vm, &ops).unwrap();
        assert_eq!(results, vec![3, 9, 0]);
    }

    #[test]
    fn test_run_trace_propagates_engine_errors() {
        let mut vm = tiny_vm();
        let ops = vec![TraceOp::Write(0, 1), TraceOp::Read(32)];
        assert!(run_trace(&mut vm, &ops).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.txt");
        let out_path = dir.path().join("out.txt");
        fs::write(&trace_path, "w 31 42\nw 0 99\nr 31\nr 0\n").unwrap();

        let ops = read_trace(&trace_path).unwrap();
        let mut vm = tiny_vm();
        let results = run_trace(&mut vm, &ops).unwrap();
        write_results(&out_path, &results).unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "42 99");
    }

    #[test]
    fn test_read_trace_missing_file() {
        let err = read_trace("/nonexistent/trace.txt").unwrap_err();
        assert!(matches!(err, TraceError::Read { .. }));
    }
}
