use sift_domain::SearchHit;

use crate::SearchService;

impl SearchService {
	/// Score every passage against the query with the rerank provider.
	///
	/// Returns whether reranking was applied. A provider failure or a
	/// mismatched response leaves the hits untouched so the pipeline can
	/// continue on retrieval scores alone.
	pub(crate) async fn apply_rerank(&self, query: &str, hits: &mut [SearchHit]) -> bool {
		let documents: Vec<String> = hits.iter().map(|hit| hit.passage.text.clone()).collect();
		let scores =
			match self.providers.rerank.rerank(&self.cfg.providers.rerank, query, &documents).await
			{
				Ok(scores) => scores,
				Err(err) => {
					tracing::warn!(error = %err, "Reranking failed, keeping retrieval order.");

					return false;
				},
			};

		if scores.len() != hits.len() {
			tracing::warn!(
				expected = hits.len(),
				received = scores.len(),
				"Rerank response size mismatch, keeping retrieval order."
			);

			return false;
		}

		for (hit, score) in hits.iter_mut().zip(scores) {
			hit.explain.rerank_score = Some(score);
		}

		true
	}
}
