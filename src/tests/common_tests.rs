// src/tests/common_tests.rs

//! tests for `common.rs`

#![allow(non_snake_case)]

use crate::common::{AllocatorChosen, ResultS3};

use ::test_case::test_case;

type ResultS3_Test = ResultS3<u8, std::io::Error>;

fn err() -> ResultS3_Test {
    ResultS3::Err(std::io::Error::new(std::io::ErrorKind::Other, "oops"))
}

#[test]
fn test_ResultS3_Found() {
    let r: ResultS3_Test = ResultS3::Found(5);
    assert!(r.is_ok());
    assert!(r.is_found());
    assert!(!r.is_done());
    assert!(!r.is_err());
    assert_eq!(r.ok(), Some(5));
}

#[test]
fn test_ResultS3_Done() {
    let r: ResultS3_Test = ResultS3::Done;
    assert!(r.is_ok());
    assert!(!r.is_found());
    assert!(r.is_done());
    assert!(!r.is_err());
    assert_eq!(r.ok(), None);
}

#[test]
fn test_ResultS3_Err() {
    let r: ResultS3_Test = err();
    assert!(!r.is_ok());
    assert!(!r.is_found());
    assert!(!r.is_done());
    assert!(r.is_err());
    let e = r.err().unwrap();
    assert_eq!(e.kind(), std::io::ErrorKind::Other);
    assert!(err().ok().is_none());
    assert!(ResultS3_Test::Found(1).err().is_none());
}

#[test]
fn test_ResultS3_Display() {
    assert_eq!(ResultS3_Test::Found(1).to_string(), "ResultS3::Found");
    assert_eq!(ResultS3_Test::Done.to_string(), "ResultS3::Done");
    assert_eq!(err().to_string(), "ResultS3::Err(oops)");
}

#[test_case(AllocatorChosen::System, "system")]
#[test_case(AllocatorChosen::Jemalloc, "jemalloc")]
#[test_case(AllocatorChosen::Mimalloc, "mimalloc")]
fn test_AllocatorChosen_Display(
    allocator: AllocatorChosen,
    expect: &str,
) {
    assert_eq!(allocator.to_string(), expect);
}
