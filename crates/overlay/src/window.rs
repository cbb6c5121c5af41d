//! Win32 host window for the overlay
//!
//! One top-most popup is created hidden and reused for every capture. It is
//! hidden between sessions and destroyed only after a fatal activation or
//! when the activation provider goes away.

use crate::{
    config::OverlayConfig,
    controller::Overlay,
    host::{Backend, WindowHost},
    input::{InputEvent, Key, PointerButton},
    lifecycle::{subscribe, ActivationListener},
    render::{Frame, GLYPH_HEIGHT, GLYPH_WIDTH},
    OverlayError, OverlayResult,
};
use snapshot::Point;
use std::cell::RefCell;
use std::mem::size_of;
use std::sync::Once;
use std::thread;
use std::time::Instant;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateFontW, DeleteObject, EndPaint, InvalidateRect, SelectObject, SetBkMode,
    SetDIBitsToDevice, SetTextColor, TextOutW, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET, DEFAULT_QUALITY, DIB_RGB_COLORS, FF_MODERN,
    FIXED_PITCH, FW_NORMAL, HDC, OUT_DEFAULT_PRECIS, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetSystemMetrics, LoadCursorW, MessageBoxW, PostMessageW, PostQuitMessage, RegisterClassExW,
    KillTimer, SetForegroundWindow, SetTimer, ShowWindow, TranslateMessage, CS_HREDRAW, CS_VREDRAW,
    IDC_CROSS, MB_ICONERROR, MB_OK, MSG, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
    SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SW_HIDE, SW_SHOW, WM_CLOSE, WM_DESTROY, WM_ERASEBKGND,
    WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE,
    WM_PAINT, WM_RBUTTONDOWN, WM_TIMER, WM_USER, WNDCLASSEXW, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_POPUP,
};

const WM_APP_ACTIVATE: u32 = WM_USER + 100;
const WM_APP_SHUTDOWN: u32 = WM_USER + 101;
const FEEDBACK_TIMER_ID: usize = 1;

const VK_SHIFT: usize = 0x10;
const VK_ESCAPE: usize = 0x1B;
const VK_C: usize = 0x43;

impl From<windows::core::Error> for OverlayError {
    fn from(e: windows::core::Error) -> Self {
        OverlayError::Host(e.to_string())
    }
}

thread_local! {
    static OVERLAY_STATE: RefCell<Option<Box<OverlayState>>> = RefCell::new(None);
}

struct OverlayState {
    overlay: Overlay<Box<dyn Backend>, OverlayWindow>,
    listener: ActivationListener,
    last_frame: Option<Frame>,
    bgra: Vec<u8>,
    /// Provider hung up while a session was still open
    shutdown_pending: bool,
}

/// Run `f` against the overlay state unless it is already borrowed further
/// up the stack (modal loops and synchronous messages re-enter the window
/// procedure while a handler is running).
fn with_state<R>(f: impl FnOnce(&mut OverlayState) -> R) -> Option<R> {
    OVERLAY_STATE.with(|s| {
        let mut guard = s.try_borrow_mut().ok()?;
        guard.as_mut().map(|state| f(state))
    })
}

/// Host handle for the overlay popup
pub struct OverlayWindow {
    hwnd: isize,
}

impl OverlayWindow {
    const CLASS_NAME: PCWSTR = w!("PickShotOverlay");

    fn hwnd(&self) -> HWND {
        hwnd_from_raw(self.hwnd)
    }

    /// Create the overlay window and pump messages until it is destroyed.
    ///
    /// `listener` is drained on a relay thread for as long as the provider
    /// keeps its sender alive; each event wakes the window thread.
    pub fn run(
        backend: Box<dyn Backend>,
        config: OverlayConfig,
        listener: ActivationListener,
    ) -> OverlayResult<()> {
        unsafe {
            let hinstance = register_class()?;
            let (left, top, width, height) = virtual_desktop_rect();

            let hwnd = CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                Self::CLASS_NAME,
                w!("PickShot Selection"),
                WS_POPUP,
                left,
                top,
                width,
                height,
                None,
                None,
                hinstance,
                None,
            )?;
            let hwnd_raw = hwnd.0 as isize;

            let (relay_tx, relay_rx) = subscribe();
            let overlay = Overlay::new(backend, OverlayWindow { hwnd: hwnd_raw }, config);
            OVERLAY_STATE.with(|s| {
                *s.borrow_mut() = Some(Box::new(OverlayState {
                    overlay,
                    listener: relay_rx,
                    last_frame: None,
                    bgra: Vec::new(),
                    shutdown_pending: false,
                }));
            });

            let relay = thread::spawn(move || {
                let hwnd = hwnd_from_raw(hwnd_raw);
                while let Ok(event) = listener.recv() {
                    if relay_tx.send(event).is_err() {
                        break;
                    }
                    let _ = PostMessageW(hwnd, WM_APP_ACTIVATE, WPARAM(0), LPARAM(0));
                }
                tracing::debug!("activation provider disconnected");
                let _ = PostMessageW(hwnd, WM_APP_SHUTDOWN, WPARAM(0), LPARAM(0));
            });

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }

            OVERLAY_STATE.with(|s| {
                *s.borrow_mut() = None;
            });
            // the relay exits on its own once the provider hangs up
            drop(relay);
        }

        Ok(())
    }

    unsafe extern "system" fn wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let handled = match msg {
            WM_PAINT => with_state(|state| Self::paint(hwnd, state)),

            WM_ERASEBKGND => Some(()),

            WM_TIMER if wparam.0 == FEEDBACK_TIMER_ID => with_state(|state| {
                let _ = KillTimer(hwnd, FEEDBACK_TIMER_ID);
                if let Some(frame) = state.overlay.poll_frame(Instant::now()) {
                    state.last_frame = Some(frame);
                    let _ = InvalidateRect(hwnd, None, false);
                }
                schedule_wakeup(hwnd, state);
            }),

            WM_APP_ACTIVATE => with_state(|state| {
                state.last_frame = None;
                if let Err(e) = state.overlay.dispatch(&state.listener) {
                    tracing::warn!(error = %e, "failed to drain activations");
                }
                if state.overlay.is_closed() {
                    return;
                }
                let _ = InvalidateRect(hwnd, None, false);
                schedule_wakeup(hwnd, state);
            }),

            WM_APP_SHUTDOWN => with_state(|state| {
                if state.overlay.session().is_some() {
                    state.shutdown_pending = true;
                } else {
                    let _ = DestroyWindow(hwnd);
                }
            }),

            WM_LBUTTONDOWN => {
                let _ = SetCapture(hwnd);
                Self::pointer(hwnd, lparam, |position| InputEvent::PointerDown {
                    button: PointerButton::Primary,
                    position,
                })
            }

            WM_LBUTTONUP => {
                let _ = ReleaseCapture();
                Self::pointer(hwnd, lparam, |position| InputEvent::PointerUp {
                    button: PointerButton::Primary,
                    position,
                })
            }

            WM_RBUTTONDOWN => Self::pointer(hwnd, lparam, |position| InputEvent::PointerDown {
                button: PointerButton::Secondary,
                position,
            }),

            WM_MBUTTONDOWN => Self::pointer(hwnd, lparam, |position| InputEvent::PointerDown {
                button: PointerButton::Middle,
                position,
            }),

            WM_MBUTTONUP => Self::pointer(hwnd, lparam, |position| InputEvent::PointerUp {
                button: PointerButton::Middle,
                position,
            }),

            WM_MOUSEMOVE => Self::pointer(hwnd, lparam, |position| InputEvent::PointerMove {
                position,
            }),

            WM_KEYDOWN => {
                let repeat = (lparam.0 >> 30) & 1 == 1;
                let key = match wparam.0 {
                    VK_ESCAPE => Some(Key::Escape),
                    VK_SHIFT if !repeat => Some(Key::ToggleFormat),
                    VK_C if !repeat => Some(Key::CopyColor),
                    _ => None,
                };
                match key {
                    Some(key) => Self::dispatch_input(hwnd, InputEvent::Key(key)),
                    None => None,
                }
            }

            // Closing from the outside only cancels; the window is reused.
            WM_CLOSE => Self::dispatch_input(hwnd, InputEvent::Key(Key::Escape)),

            WM_DESTROY => {
                PostQuitMessage(0);
                Some(())
            }

            _ => None,
        };

        match handled {
            Some(()) => LRESULT(0),
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    unsafe fn pointer(
        hwnd: HWND,
        lparam: LPARAM,
        event: impl FnOnce(Point) -> InputEvent,
    ) -> Option<()> {
        let x = (lparam.0 & 0xFFFF) as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
        Self::dispatch_input(hwnd, event(Point::new(x, y)))
    }

    unsafe fn dispatch_input(hwnd: HWND, event: InputEvent) -> Option<()> {
        with_state(|state| {
            if state.overlay.handle_input(event, Instant::now()).is_some() {
                // session resolved; never show its pixels again
                state.last_frame = None;
                if state.shutdown_pending {
                    let _ = DestroyWindow(hwnd);
                }
                return;
            }

            if state.overlay.frame_pending() {
                let _ = InvalidateRect(hwnd, None, false);
            }
            schedule_wakeup(hwnd, state);
        })
    }

    unsafe fn paint(hwnd: HWND, state: &mut OverlayState) {
        if let Some(frame) = state.overlay.poll_frame(Instant::now()) {
            state.last_frame = Some(frame);
        }

        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);

        if let Some(ref frame) = state.last_frame {
            draw_surface(hdc, frame, &mut state.bgra);
            draw_labels(hdc, frame);
        }

        let _ = EndPaint(hwnd, &ps);
    }
}

impl WindowHost for OverlayWindow {
    fn show(&mut self) -> anyhow::Result<()> {
        unsafe {
            let _ = ShowWindow(self.hwnd(), SW_SHOW);
            let _ = SetForegroundWindow(self.hwnd());
        }
        Ok(())
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        unsafe {
            let _ = KillTimer(self.hwnd(), FEEDBACK_TIMER_ID);
            let _ = ShowWindow(self.hwnd(), SW_HIDE);
        }
        Ok(())
    }

    fn close(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd());
        }
    }

    fn alert(&mut self, message: &str) {
        let text = wide(message);
        unsafe {
            let _ = MessageBoxW(
                self.hwnd(),
                PCWSTR(text.as_ptr()),
                w!("PickShot"),
                MB_OK | MB_ICONERROR,
            );
        }
    }
}

static REGISTER: Once = Once::new();

unsafe fn register_class() -> OverlayResult<HINSTANCE> {
    let hmodule = GetModuleHandleW(None)?;
    let hinstance = HINSTANCE(hmodule.0);
    let cursor = LoadCursorW(None, IDC_CROSS)?;

    REGISTER.call_once(|| {
        let wc = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(OverlayWindow::wnd_proc),
            hInstance: hinstance,
            hCursor: cursor,
            lpszClassName: OverlayWindow::CLASS_NAME,
            ..Default::default()
        };

        let _ = RegisterClassExW(&wc);
    });

    Ok(hinstance)
}

/// Virtual desktop as (left, top, width, height)
fn virtual_desktop_rect() -> (i32, i32, i32, i32) {
    unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    }
}

fn hwnd_from_raw(raw: isize) -> HWND {
    HWND(raw as *mut std::ffi::c_void)
}

fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe fn draw_surface(hdc: HDC, frame: &Frame, bgra: &mut Vec<u8>) {
    let width = frame.surface.width() as i32;
    let height = frame.surface.height() as i32;

    bgra.clear();
    bgra.extend_from_slice(frame.surface.as_raw());
    for px in bgra.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            biHeight: -height, // Top-down
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        bmiColors: [Default::default()],
    };

    SetDIBitsToDevice(
        hdc,
        0,
        0,
        width as u32,
        height as u32,
        0,
        0,
        0,
        height as u32,
        bgra.as_ptr() as *const _,
        &bmi,
        DIB_RGB_COLORS,
    );
}

/// Wake the window for the next deadline no input will trigger: the end of
/// the copy flash. Frames for input are driven by `WM_PAINT` alone.
unsafe fn schedule_wakeup(hwnd: HWND, state: &OverlayState) {
    if let Some(deadline) = state.overlay.next_wakeup() {
        let delay = deadline.saturating_duration_since(Instant::now());
        let ms = delay.as_millis().min(u32::MAX as u128) as u32 + 1;
        let _ = SetTimer(hwnd, FEEDBACK_TIMER_ID, ms, None);
    }
}

unsafe fn draw_labels(hdc: HDC, frame: &Frame) {
    if frame.labels.is_empty() {
        return;
    }

    // Fixed-pitch cell matching the metrics the compositor sized the boxes with
    let font = CreateFontW(
        GLYPH_HEIGHT as i32,
        GLYPH_WIDTH as i32,
        0,
        0,
        FW_NORMAL.0 as i32,
        0,
        0,
        0,
        DEFAULT_CHARSET.0 as u32,
        OUT_DEFAULT_PRECIS.0 as u32,
        CLIP_DEFAULT_PRECIS.0 as u32,
        DEFAULT_QUALITY.0 as u32,
        (FIXED_PITCH.0 | FF_MODERN.0) as u32,
        w!("Consolas"),
    );
    let old_font = SelectObject(hdc, font);
    SetBkMode(hdc, TRANSPARENT);

    for label in &frame.labels {
        let [r, g, b, _] = label.color.0;
        SetTextColor(
            hdc,
            COLORREF(r as u32 | (g as u32) << 8 | (b as u32) << 16),
        );

        let origin = label.text_origin();
        let text: Vec<u16> = label.text.encode_utf16().collect();
        let _ = TextOutW(hdc, origin.x, origin.y, &text);
    }

    SelectObject(hdc, old_font);
    let _ = DeleteObject(font);
}
