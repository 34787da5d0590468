//! Windows event loop: a hidden top-level window owns the tray icon.
//!
//! Everything touching the tray runs on the thread that created the window.
//! Stdin lines arrive from a reader thread through a channel, each one
//! followed by a wake-up message posted to the window.

use std::cell::RefCell;
use std::ffi::c_void;
use std::io::{BufRead, Stdout};
use std::sync::mpsc;

use anyhow::Context;
use traybridge_tray::{TrayController, Win32Backend, WindowHandle, WindowMessage};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GWLP_USERDATA,
    GetMessageW, GetWindowLongPtrW, HMENU, MSG, PostMessageW, PostQuitMessage, RegisterClassW,
    SetWindowLongPtrW, TranslateMessage, WINDOW_EX_STYLE, WM_APP, WM_CLOSE, WM_DESTROY,
    WNDCLASSW, WS_OVERLAPPED,
};
use windows::core::w;

use crate::config::Config;
use crate::session::{self, LineTray, LineWriter};

/// Posted after a stdin line has been queued.
const WM_HOST_INBOX: u32 = WM_APP + 1;

struct HostWindow {
    tray: RefCell<LineTray<Win32Backend, Stdout>>,
    inbox: mpsc::Receiver<String>,
}

impl HostWindow {
    /// Handles every queued line. While a popup menu's modal loop holds the
    /// tray the lines stay queued and are picked up once it returns.
    fn drain_inbox(&self, hwnd: HWND) {
        let failed = {
            let Ok(mut tray) = self.tray.try_borrow_mut() else {
                return;
            };
            let mut failed = false;
            while let Ok(line) = self.inbox.try_recv() {
                if let Err(e) = session::handle_line(&mut *tray, &line) {
                    tracing::error!("failed to write reply: {e}");
                    failed = true;
                    break;
                }
            }
            failed
        };
        if failed {
            let _ = unsafe { DestroyWindow(hwnd) };
        }
    }

    fn remove_icon(&self) {
        if let Ok(mut tray) = self.tray.try_borrow_mut() {
            if let Err(e) = tray.destroy() {
                tracing::warn!("failed to remove tray icon: {e}");
            }
        }
    }

    fn window_message(&self, message: &WindowMessage) -> Option<isize> {
        let mut tray = self.tray.try_borrow_mut().ok()?;
        tray.handle_window_message(message)
    }
}

unsafe extern "system" fn host_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let state = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const HostWindow;
    if state.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    // SAFETY: set from a live Box in `run` and cleared before the Box is freed.
    let state = unsafe { &*state };

    match msg {
        WM_HOST_INBOX => {
            state.drain_inbox(hwnd);
            LRESULT(0)
        }
        WM_CLOSE => {
            let _ = unsafe { DestroyWindow(hwnd) };
            LRESULT(0)
        }
        WM_DESTROY => {
            state.remove_icon();
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => {
            let message =
                WindowMessage::new(WindowHandle(hwnd.0 as isize), msg, wparam.0, lparam.0);
            match state.window_message(&message) {
                Some(result) => LRESULT(result),
                None => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
            }
        }
    }
}

fn create_host_window() -> anyhow::Result<HWND> {
    unsafe {
        let hinstance = GetModuleHandleW(None).context("GetModuleHandleW failed")?;
        let class_name = w!("TrayBridgeHostWindow");

        let wc = WNDCLASSW {
            lpfnWndProc: Some(host_wnd_proc),
            hInstance: hinstance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(windows::core::Error::from_win32()).context("RegisterClassW failed");
        }

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("traybridge"),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
        .context("CreateWindowExW failed")?;
        if hwnd.0.is_null() {
            anyhow::bail!("CreateWindowExW returned a null window");
        }
        Ok(hwnd)
    }
}

fn post(window: isize, msg: u32) {
    let hwnd = HWND(window as *mut c_void);
    if let Err(e) = unsafe { PostMessageW(hwnd, msg, WPARAM(0), LPARAM(0)) } {
        tracing::debug!(msg, "PostMessageW failed: {e}");
    }
}

fn spawn_stdin_reader(window: isize, inbox: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if inbox.send(line).is_err() {
                        return;
                    }
                    post(window, WM_HOST_INBOX);
                }
                Err(e) => {
                    tracing::warn!("failed to read stdin: {e}");
                    break;
                }
            }
        }
        tracing::info!("stdin closed, shutting down");
        post(window, WM_CLOSE);
    });
}

fn spawn_ctrl_c_watcher(window: isize) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::spawn(move || {
        if rt.block_on(tokio::signal::ctrl_c()).is_ok() {
            tracing::info!("SIGINT received, shutting down");
            post(window, WM_CLOSE);
        }
    });
    Ok(())
}

/// Runs the window's message loop until the window is destroyed.
pub fn run(config: Config) -> anyhow::Result<()> {
    let hwnd = create_host_window()?;
    let window = hwnd.0 as isize;
    spawn_ctrl_c_watcher(window)?;

    let (inbox_tx, inbox_rx) = mpsc::channel();
    let host = Box::new(HostWindow {
        tray: RefCell::new(TrayController::new(
            Win32Backend::new(WindowHandle(window)),
            LineWriter::new(std::io::stdout()),
            config.tray.clone(),
        )),
        inbox: inbox_rx,
    });
    let host = Box::into_raw(host);
    unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, host as isize) };

    {
        // SAFETY: `host` stays valid until reclaimed below.
        let host = unsafe { &*host };
        session::show_startup_icon(&mut *host.tray.borrow_mut(), config.icon_path.as_deref());
    }

    spawn_stdin_reader(window, inbox_tx);
    tracing::info!(window, "native tray ready");

    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
        drop(Box::from_raw(host));
    }
    Ok(())
}
