//! Cursor-following object stream

use std::collections::VecDeque;

use bunq_domain::{ApiObject, ApiRequest, BunqResult, RequestOptions};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::trace;

use super::BunqClient;

struct Cursor {
    next: Option<String>,
    buffered: VecDeque<ApiObject>,
    pages: usize,
}

pub(super) fn paginate(
    client: &BunqClient,
    resource: String,
    options: RequestOptions,
) -> BoxStream<'_, BunqResult<ApiObject>> {
    let start = Cursor { next: Some(resource), buffered: VecDeque::new(), pages: 0 };

    stream::unfold(start, move |mut cursor| {
        let options = options.clone();
        async move {
            loop {
                if let Some(object) = cursor.buffered.pop_front() {
                    return Some((Ok(object), cursor));
                }

                let url = cursor.next.take()?;
                let request = ApiRequest::get(url).with_options(options.clone());
                match client.request(request).await {
                    Ok(page) => {
                        cursor.pages += 1;
                        cursor.next = page.older_cursor().map(str::to_owned);
                        trace!(
                            page = cursor.pages,
                            objects = page.objects.len(),
                            more = cursor.next.is_some(),
                            "fetched page"
                        );
                        cursor.buffered = page.objects.into();
                    }
                    // `next` is already taken, so the stream ends after this.
                    Err(err) => return Some((Err(err), cursor)),
                }
            }
        }
    })
    .boxed()
}
