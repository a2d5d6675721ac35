// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Reporter`] seam for rendering executed runs.

use crate::{runner::Run, summary::Summary, Result};

/// Consumer of an executed [`Run`], rendering it somewhere.
///
/// Invoked once per run, after the `after_all` hook, and only when reporting
/// is enabled.
pub trait Reporter {
    /// Reports the given [`Run`] and its [`Summary`].
    ///
    /// # Errors
    ///
    /// If rendering fails.
    fn report(&mut self, run: &Run, summary: &Summary<'_>) -> Result<()>;
}

impl<F> Reporter for F
where
    F: FnMut(&Run, &Summary<'_>) -> Result<()>,
{
    fn report(&mut self, run: &Run, summary: &Summary<'_>) -> Result<()> {
        self(run, summary)
    }
}
