//! JSONC 지원 - 선언 파일과 설정 파일의 주석 제거

use crate::Result;
use serde::de::DeserializeOwned;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
}

/// `//` 라인 주석과 `/* */` 블록 주석을 제거한다.
///
/// 문자열 리터럴 안의 슬래시는 그대로 둔다. 라인 주석 뒤의 개행은 유지해서
/// serde_json 에러의 줄 번호가 원본과 맞도록 한다.
pub fn strip_json_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut state = Scan::Code;

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (Scan::Code, '"') => {
                output.push(c);
                Scan::Str
            }
            (Scan::Code, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                Scan::LineComment
            }
            (Scan::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                Scan::BlockComment
            }
            (Scan::Code, _) => {
                output.push(c);
                Scan::Code
            }
            (Scan::Str, '\\') => {
                output.push(c);
                Scan::StrEscape
            }
            (Scan::Str, '"') => {
                output.push(c);
                Scan::Code
            }
            (Scan::Str, _) | (Scan::StrEscape, _) => {
                output.push(c);
                Scan::Str
            }
            (Scan::LineComment, '\n') => {
                output.push(c);
                Scan::Code
            }
            (Scan::LineComment, _) => Scan::LineComment,
            (Scan::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                Scan::Code
            }
            (Scan::BlockComment, _) => Scan::BlockComment,
        };
    }

    output
}

/// 주석을 허용하는 JSON 파싱
pub fn parse_jsonc<T: DeserializeOwned>(input: &str) -> Result<T> {
    Ok(serde_json::from_str(&strip_json_comments(input))?)
}
