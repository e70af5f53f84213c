//! The transmit buffer is allocated once per send and released once,
//! whether or not the transfer succeeds.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use ws2812_spi::encoder::frame_len;
use ws2812_spi::{Config, Rgb, Transfer, Ws2812};

// Odd size so nothing else in the harness is likely to match it.
const PIXELS: usize = 113;
const FRAME: usize = frame_len(PIXELS);

struct CountingAlloc;

static FRAME_ALLOCS: AtomicUsize = AtomicUsize::new(0);
static FRAME_FREES: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() == FRAME {
            FRAME_ALLOCS.fetch_add(1, Ordering::SeqCst);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.size() == FRAME {
            FRAME_FREES.fetch_add(1, Ordering::SeqCst);
        }
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

/// Checks the frame length without copying the buffer.
struct LengthCheckingBus {
    fail: bool,
}

impl Transfer for LengthCheckingBus {
    type Error = ();

    fn transfer(&mut self, tx: &[u8], _: u32, _: u8) -> Result<usize, ()> {
        assert_eq!(tx.len(), FRAME);
        // the buffer is alive while the bus has it
        assert_eq!(
            FRAME_ALLOCS.load(Ordering::SeqCst),
            FRAME_FREES.load(Ordering::SeqCst) + 1
        );
        if self.fail {
            Err(())
        } else {
            Ok(tx.len())
        }
    }
}

fn counts() -> (usize, usize) {
    (
        FRAME_ALLOCS.load(Ordering::SeqCst),
        FRAME_FREES.load(Ordering::SeqCst),
    )
}

// One test function so the counters are not shared between parallel tests.
#[test]
fn buffer_released_once_on_success_and_failure() {
    let pixels = vec![Rgb::new(0x12, 0x34, 0x56); PIXELS];

    let mut ok = Ws2812::new(LengthCheckingBus { fail: false }, Config::default());
    let before = counts();
    assert_eq!(ok.send(&pixels).unwrap(), FRAME);
    let after = counts();
    assert_eq!(after.0 - before.0, 1);
    assert_eq!(after.1 - before.1, 1);

    let mut failing = Ws2812::new(LengthCheckingBus { fail: true }, Config::default());
    let before = counts();
    assert!(failing.send(&pixels).is_err());
    let after = counts();
    assert_eq!(after.0 - before.0, 1);
    assert_eq!(after.1 - before.1, 1);

    // rejected sends never allocate a frame
    failing.close();
    let before = counts();
    assert!(failing.send(&pixels).is_err());
    assert!(ok.send(&[]).is_err());
    assert_eq!(counts(), before);
}
