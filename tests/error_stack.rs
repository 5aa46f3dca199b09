use cryptoguard::error::Reason;
use cryptoguard::error_stack::{
    ClearErrorOnReturn, CryptoErrorList, DEFAULT_QUEUE_CAPACITY, MarkPopErrorOnReturn,
    clear_error_on_return, clear_errors, error_depth, get_error, mark_pop_error_on_return,
    peek_error, peek_last_error, pop_to_mark, put_error, put_error_with_data, set_mark,
};

/// A mark-pop scope inside a clear scope removes only its own records; the
/// clear scope then removes everything.
#[test]
fn mark_pop_nested_in_clear() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);

    let mut outer = CryptoErrorList::new();
    let mut inner = CryptoErrorList::new();
    {
        let _clear = ClearErrorOnReturn::new(Some(&mut outer));
        put_error(Reason::ASN1_DECODE_ERROR);
        {
            let _mark = MarkPopErrorOnReturn::new(Some(&mut inner));
            put_error(Reason::EVP_DECODE_ERROR);
        }
        assert_eq!(error_depth(), 2);
        assert_eq!(peek_last_error(), Some(Reason::ASN1_DECODE_ERROR.error_code()));
    }

    assert_eq!(error_depth(), 0);
    assert_eq!(inner.len(), 3);
    assert_eq!(
        inner.peek_back(),
        Some("error:03000072:digital envelope routines::decode error")
    );
    assert_eq!(outer.len(), 2);
    assert_eq!(
        outer.peek_front(),
        Some("error:0480006C:PEM routines::no start line")
    );
}

#[test]
fn capture_is_idempotent() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);
    put_error_with_data(Reason::ENGINE_NO_SUCH_ENGINE, "id=hsm");

    let mut first = CryptoErrorList::new();
    first.capture();
    let mut second = CryptoErrorList::new();
    second.capture();
    assert_eq!(first, second);
    assert_eq!(error_depth(), 2);

    first.capture();
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "error:0480006C:PEM routines::no start line",
            "error:13000074:engine routines::no such engine:id=hsm",
        ]
    );
    clear_errors();
}

#[test]
fn marks_survive_unrelated_records() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);
    let mark = set_mark();
    assert_eq!(pop_to_mark(mark), 0);

    put_error(Reason::ASN1_DECODE_ERROR);
    put_error(Reason::ASN1_ENCODE_ERROR);
    assert_eq!(pop_to_mark(mark), 2);
    assert_eq!(error_depth(), 1);
    assert_eq!(peek_error(), Some(Reason::PEM_NO_START_LINE.error_code()));
    clear_errors();
}

#[test]
fn oldest_records_are_evicted() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);
    for _ in 0..DEFAULT_QUEUE_CAPACITY {
        put_error(Reason::ASN1_DECODE_ERROR);
    }
    assert_eq!(error_depth(), DEFAULT_QUEUE_CAPACITY);
    assert_eq!(peek_error(), Some(Reason::ASN1_DECODE_ERROR.error_code()));
    clear_errors();
}

#[test]
fn get_error_drains_oldest_first() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);
    put_error(Reason::ASN1_DECODE_ERROR);
    assert_eq!(get_error(), Some(Reason::PEM_NO_START_LINE.error_code()));
    assert_eq!(get_error(), Some(Reason::ASN1_DECODE_ERROR.error_code()));
    assert_eq!(get_error(), None);
}

#[test]
fn scoped_closures() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);

    let value = mark_pop_error_on_return(None, || {
        put_error(Reason::ASN1_DECODE_ERROR);
        41 + 1
    });
    assert_eq!(value, 42);
    assert_eq!(error_depth(), 1);

    let mut errors = CryptoErrorList::new();
    clear_error_on_return(Some(&mut errors), || put_error(Reason::EVP_BAD_DECRYPT));
    assert_eq!(error_depth(), 0);
    assert_eq!(errors.len(), 2);
}

#[test]
fn queues_are_per_thread() {
    clear_errors();
    put_error(Reason::PEM_NO_START_LINE);

    let other = std::thread::spawn(|| {
        let before = error_depth();
        put_error(Reason::ASN1_DECODE_ERROR);
        put_error(Reason::ASN1_DECODE_ERROR);
        (before, error_depth())
    })
    .join()
    .unwrap();

    assert_eq!(other, (0, 2));
    assert_eq!(error_depth(), 1);
    clear_errors();
}
