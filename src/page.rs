//! Page number pagination for query results

use crate::error::ValidationError;
use serde::Serialize;

/// A requested page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number
    pub number: u32,

    /// Maximum number of results per page
    pub size: u32,
}

impl PageRequest {
    /// Parse the `page` query parameter
    ///
    /// An absent or empty parameter means the first page. Anything other than a positive
    /// integer is rejected.
    pub fn parse(page: Option<&str>, size: u32) -> Result<Self, ValidationError> {
        let number = match page.map(str::trim).filter(|p| !p.is_empty()) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(number) if number > 0 => number,
                _ => return Err(ValidationError::InvalidPage),
            },
        };

        Ok(Self {
            number,
            size: size.max(1),
        })
    }

    /// Number of results before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }

    /// Number of pages needed for `total` results. Never less than one.
    pub fn page_count(&self, total: u64) -> u64 {
        let size = u64::from(self.size);

        ((total + size - 1) / size).max(1)
    }
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total number of results across every page
    pub count: u64,

    /// The following page number, if there is one
    pub next: Option<u32>,

    /// The preceding page number, if there is one
    pub previous: Option<u32>,

    /// Results on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from a request, the total number of results and the results in the window
    ///
    /// Fails if the requested page lies past the last one. The first page always exists, even
    /// when there are no results at all.
    pub fn new(request: PageRequest, count: u64, results: Vec<T>) -> Result<Self, ValidationError> {
        let pages = request.page_count(count);
        let number = u64::from(request.number);

        if number > pages {
            return Err(ValidationError::InvalidPage);
        }

        Ok(Self {
            count,
            next: if number < pages {
                Some(request.number + 1)
            } else {
                None
            },
            previous: if request.number > 1 {
                Some(request.number - 1)
            } else {
                None
            },
            results,
        })
    }
}
