#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::Session;

/// In-memory sink that stays readable after being boxed into a session.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session plus handles on its program output and diagnostics.
pub fn capture_session() -> (Session, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();

    let session = Session::with_output(Box::new(out.clone()), Box::new(err.clone()));

    (session, out, err)
}

/// Runs `source` as one unit and returns `(stdout, stderr, exit code)`.
pub fn run_source(source: &str) -> (String, String, i32) {
    let (mut session, out, err) = capture_session();
    session.run(source);

    (out.contents(), err.contents(), session.exit_code())
}
