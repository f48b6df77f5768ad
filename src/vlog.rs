//! Per-module verbosity.
//!
//! `vmodule` maps glob patterns over source file names to verbosity levels, anything
//! unmatched uses the global `v`. Every [vlog_is_on!](crate::vlog_is_on!) site keeps a
//! pointer to the level cell it resolved to, so later level changes are seen without
//! another lookup. Cells are leaked and never freed, a cached pointer stays valid forever.

use crate::raw::raw_log;
use crate::severity::Severity;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, AtomicPtr, AtomicU64, Ordering};

static FLAGS_V: AtomicI32 = AtomicI32::new(0);

/// Bumped whenever the pattern list changes shape, so call sites resolve again.
static GENERATION: AtomicU64 = AtomicU64::new(1);

struct VModuleInfo {
    pattern: String,
    level: AtomicI32,
}

struct VModuleState {
    /// The last element is the head, it is checked first.
    list: Vec<&'static VModuleInfo>,
    config: String,
    inited: bool,
}

impl VModuleState {
    fn ensure_inited(&mut self) {
        if self.inited {
            return;
        }
        // replaced entries stay allocated for call sites still pointing at them
        self.list.clear();
        for (pattern, level) in parse_vmodule(&self.config) {
            self.list.push(leak_info(pattern, level));
        }
        self.inited = true;
        GENERATION.fetch_add(1, Ordering::Release);
    }

    fn resolve(&self, module: &str) -> &'static AtomicI32 {
        for info in self.list.iter().rev() {
            if safe_fnmatch(&info.pattern, module) {
                return &info.level;
            }
        }
        &FLAGS_V
    }
}

static VMODULE: Mutex<VModuleState> =
    parking_lot::const_mutex(VModuleState { list: Vec::new(), config: String::new(), inited: false });

fn leak_info(pattern: &str, level: i32) -> &'static VModuleInfo {
    Box::leak(Box::new(VModuleInfo { pattern: pattern.to_string(), level: AtomicI32::new(level) }))
}

/// Split `a=1,b*=2` into pairs, skipping entries whose level is not a number.
fn parse_vmodule(spec: &str) -> Vec<(&str, i32)> {
    let mut entries = Vec::new();
    for item in spec.split(',') {
        if let Some((pattern, level)) = item.split_once('=') {
            if let Ok(level) = level.trim().parse::<i32>() {
                entries.push((pattern.trim(), level));
            }
        }
    }
    entries
}

/// Glob match supporting only `*` and `?`.
pub fn safe_fnmatch(pattern: &str, name: &str) -> bool {
    let p = pattern.as_bytes();
    let n = name.as_bytes();
    let (mut pi, mut ni) = (0, 0);
    // position of the last '*' and the name index it was tried at
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi] == b'?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}

/// Module name of a source path: basename up to the first '.', without a trailing "-inl".
pub fn module_name(file: &str) -> &str {
    let base = crate::utils::basename(file);
    let base = match base.find('.') {
        Some(pos) => &base[..pos],
        None => base,
    };
    base.strip_suffix("-inl").unwrap_or(base)
}

/// Global default verbosity.
#[inline]
pub fn v() -> i32 {
    FLAGS_V.load(Ordering::Relaxed)
}

pub fn set_v(level: i32) {
    FLAGS_V.store(level, Ordering::Relaxed);
}

/// Replace the `vmodule` configuration. Parsed on the next verbosity query.
pub fn set_vmodule(spec: &str) {
    let mut state = VMODULE.lock();
    state.config = spec.to_string();
    state.inited = false;
    GENERATION.fetch_add(1, Ordering::Release);
}

/// Set the level of every module matching `pattern`, returning the previous effective level.
///
/// An entry with exactly this pattern is updated in place, otherwise a new entry is
/// checked before all others from now on.
pub fn set_vlog_level(pattern: &str, level: i32) -> i32 {
    let mut result = v();
    {
        let mut state = VMODULE.lock();
        state.ensure_inited();
        let mut found_exact = false;
        let mut found = false;
        for info in state.list.iter().rev() {
            if info.pattern == pattern {
                if !found_exact {
                    if !found {
                        result = info.level.load(Ordering::Relaxed);
                        found = true;
                    }
                    found_exact = true;
                }
                info.level.store(level, Ordering::Relaxed);
            } else if !found && safe_fnmatch(&info.pattern, pattern) {
                result = info.level.load(Ordering::Relaxed);
                found = true;
            }
        }
        if !found_exact {
            state.list.push(leak_info(pattern, level));
            GENERATION.fetch_add(1, Ordering::Release);
        }
    }
    // the list lock is released, vlog itself may run now
    raw_log(
        Severity::Info,
        file!(),
        line!(),
        format_args!("Set VLOG level for \"{}\" to {}", pattern, level),
    );
    result
}

/// Resolve without a call-site cache.
pub fn vlog_is_on_uncached(file: &str, verbose_level: i32) -> bool {
    let mut state = VMODULE.lock();
    state.ensure_inited();
    state.resolve(module_name(file)).load(Ordering::Relaxed) >= verbose_level
}

/// Cache of one `vlog_is_on!` call site.
pub struct VLogSite {
    level: AtomicPtr<AtomicI32>,
    generation: AtomicU64,
}

impl VLogSite {
    pub const fn new() -> Self {
        Self { level: AtomicPtr::new(std::ptr::null_mut()), generation: AtomicU64::new(0) }
    }

    #[inline]
    pub fn is_on(&self, file: &str, verbose_level: i32) -> bool {
        let ptr = self.level.load(Ordering::Acquire);
        if !ptr.is_null() && self.generation.load(Ordering::Acquire) == GENERATION.load(Ordering::Acquire) {
            // only ever points at FLAGS_V or a leaked cell
            let cell = unsafe { &*ptr };
            return cell.load(Ordering::Relaxed) >= verbose_level;
        }
        self.init(file, verbose_level)
    }

    #[cold]
    fn init(&self, file: &str, verbose_level: i32) -> bool {
        let mut state = VMODULE.lock();
        state.ensure_inited();
        let cell = state.resolve(module_name(file));
        self.generation.store(GENERATION.load(Ordering::Acquire), Ordering::Release);
        self.level.store(cell as *const AtomicI32 as *mut AtomicI32, Ordering::Release);
        cell.load(Ordering::Relaxed) >= verbose_level
    }
}

/// Forget every pattern, including the parsed `vmodule` string.
#[doc(hidden)]
pub fn reset_vmodule() {
    let mut state = VMODULE.lock();
    state.list.clear();
    state.config.clear();
    state.inited = false;
    GENERATION.fetch_add(1, Ordering::Release);
}

#[doc(hidden)]
pub fn vmodule_count() -> usize {
    VMODULE.lock().list.len()
}
