use std::sync::{Arc, Mutex};

use super::*;

#[test]
fn inline_runs_immediately() {
    let hits = Arc::new(Mutex::new(0));
    let h = Arc::clone(&hits);
    InlineSubmission.enqueue(Box::new(move || *h.lock().unwrap() += 1));
    assert_eq!(*hits.lock().unwrap(), 1);
    assert!(InlineSubmission.is_inline());
}

#[test]
fn render_thread_runs_in_order_and_flush_is_a_fence() {
    let rt = RenderThread::spawn("test-render").unwrap();
    assert!(!rt.is_inline());
    assert!(!rt.is_current());

    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..10 {
        let s = Arc::clone(&seen);
        rt.enqueue(Box::new(move || s.lock().unwrap().push(i)));
    }
    rt.flush();
    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn work_runs_on_the_named_thread() {
    let rt = RenderThread::spawn("named-render").unwrap();
    let name = Arc::new(Mutex::new(None));
    let n = Arc::clone(&name);
    rt.enqueue(Box::new(move || {
        *n.lock().unwrap() = std::thread::current().name().map(str::to_string);
    }));
    rt.flush();
    assert_eq!(name.lock().unwrap().as_deref(), Some("named-render"));
}

#[test]
fn panicking_work_does_not_stop_the_thread() {
    let rt = RenderThread::spawn("panicky").unwrap();
    rt.enqueue(Box::new(|| panic!("boom")));
    let ok = Arc::new(Mutex::new(false));
    let o = Arc::clone(&ok);
    rt.enqueue(Box::new(move || *o.lock().unwrap() = true));
    rt.flush();
    assert!(*ok.lock().unwrap());
}

#[test]
fn drop_drains_pending_work() {
    let seen = Arc::new(Mutex::new(0));
    {
        let rt = RenderThread::spawn("drain").unwrap();
        for _ in 0..5 {
            let s = Arc::clone(&seen);
            rt.enqueue(Box::new(move || *s.lock().unwrap() += 1));
        }
    }
    assert_eq!(*seen.lock().unwrap(), 5);
}
