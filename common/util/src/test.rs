use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use predicates::function::{function, FnPredicate};
use tempfile::TempDir;

/// Builds a path to a file in the temporary directory and returns both the full path and the file name.
pub fn build_temp_file(temp_dir: &TempDir, base: &str, extension: &str) -> (PathBuf, PathBuf) {
    let mut file_name = PathBuf::from(base);
    file_name.set_extension(extension);

    let mut path = PathBuf::from(temp_dir.path());
    path.push(&file_name);

    (path, file_name)
}

/// Writes `content` to a file in the temporary directory, returning the full path.
pub fn write_temp_file(temp_dir: &TempDir, base: &str, extension: &str, content: &str) -> PathBuf {
    let (path, _file_name) = build_temp_file(temp_dir, base, extension);

    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes())
        .unwrap();

    path
}

/// Splits each argument on whitespace so that `"--script design.json"` becomes two args.
pub fn prepare_args(args: Vec<&str>) -> Vec<&str> {
    args.iter()
        .flat_map(|arg| arg.split_whitespace())
        .collect()
}

/// A predicate that always passes, printing the output it was given, for use with `assert_cmd`.
pub fn print(message: &str) -> FnPredicate<impl Fn(&[u8]) -> bool, [u8]> {
    let message = message.to_string();
    function(move |content: &[u8]| {
        println!("{}:\n{}", message, String::from_utf8_lossy(content));
        true
    })
}

/// Asserts that each of the expected strings occurs in the content, each after the previous one.
#[macro_export]
macro_rules! assert_contains_inorder {
    ($content:expr, [$($expected:expr),* $(,)?]) => {{
        let content: &str = &$content;
        let mut remaining: &str = content;
        $(
            let expected: &str = $expected;
            match remaining.find(expected) {
                Some(index) => remaining = &remaining[index + expected.len()..],
                None => panic!("expected content not found, or not in order. expected: {:?}\ncontent:\n{}", expected, content),
            }
        )*
        let _ = remaining;
    }};
}

#[cfg(test)]
mod prepare_args_tests {
    use super::prepare_args;

    #[test]
    fn splits_on_whitespace() {
        // when
        let args = prepare_args(vec!["--script design.json", "report", "--lanes 2"]);

        // then
        assert_eq!(args, vec!["--script", "design.json", "report", "--lanes", "2"]);
    }
}

#[cfg(test)]
mod assert_contains_inorder_tests {
    #[test]
    fn in_order() {
        assert_contains_inorder!("alpha beta gamma".to_string(), ["alpha", "gamma"]);
    }

    #[test]
    #[should_panic]
    fn out_of_order() {
        assert_contains_inorder!("alpha beta gamma".to_string(), ["gamma", "alpha"]);
    }
}
