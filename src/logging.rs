use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

static RUN_START: OnceLock<Instant> = OnceLock::new();

pub fn dev_log(message: &str) {
    if !cfg!(debug_assertions) {
        return;
    }

    let start = RUN_START.get_or_init(Instant::now);
    let elapsed_ms = start.elapsed().as_millis();
    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");
    println!("[{elapsed_ms:>5}ms][{thread_name}] {message}");
}

#[macro_export]
macro_rules! log_dev {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::logging::dev_log(&format!($($arg)*));
        }
    };
}
